use serde::Deserialize;
use serde::Serialize;

use crate::Span;

/// Which side of an offset an insertion anchors to.
///
/// Two blocks can anchor edits at the same offset (an opening marker for one
/// element and the closing marker of the block ending right before it); the
/// anchor side plus the per-side sequence rule below keeps those edits in
/// the order the emitter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Anchor {
	/// Anchored to the content before the offset. Same-offset left inserts
	/// render in ascending insertion order.
	Left,
	/// Anchored to the content after the offset. Same-offset right inserts
	/// render in descending insertion order, so the most recently inserted
	/// text ends up innermost.
	Right,
}

#[derive(Debug, Clone)]
struct Edit {
	offset: usize,
	anchor: Anchor,
	sequence: usize,
	text: String,
}

/// An ordering-sensitive text-edit buffer over one source string.
///
/// Collects insertions and deletions against input byte offsets, then
/// renders them in a single pass into the output text plus a
/// [`PositionMap`]. Nothing is applied until [`render`](Self::render), so a
/// transform that fails midway produces no partial output.
#[derive(Debug, Default)]
pub struct TextEditor {
	edits: Vec<Edit>,
	removals: Vec<Span>,
	sequence: usize,
}

impl TextEditor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert `text` at `offset`, anchored to the content before it.
	pub fn insert_left(&mut self, offset: usize, text: impl Into<String>) {
		self.push(offset, Anchor::Left, text.into());
	}

	/// Insert `text` at `offset`, anchored to the content after it.
	pub fn insert_right(&mut self, offset: usize, text: impl Into<String>) {
		self.push(offset, Anchor::Right, text.into());
	}

	fn push(&mut self, offset: usize, anchor: Anchor, text: String) {
		self.edits.push(Edit {
			offset,
			anchor,
			sequence: self.sequence,
			text,
		});
		self.sequence += 1;
	}

	/// Delete a source range from the output. Overlapping and adjacent
	/// removals coalesce.
	pub fn remove(&mut self, span: Span) {
		if !span.is_empty() {
			self.removals.push(span);
		}
	}

	/// Apply all edits against the source, producing the output text and the
	/// output-to-input position map.
	pub fn render(&self, source: &str) -> Rendered {
		let mut edits = self.edits.clone();
		edits.sort_by_key(|edit| {
			// Left inserts keep insertion order; right inserts reverse it.
			let sequence = match edit.anchor {
				Anchor::Left => edit.sequence,
				Anchor::Right => usize::MAX - edit.sequence,
			};
			(edit.offset, edit.anchor, sequence)
		});

		let mut renderer = Renderer::new(source, self.merged_removals());
		for edit in &edits {
			renderer.emit_until(edit.offset);
			renderer.insert(&edit.text);
		}
		renderer.emit_until(source.len());
		renderer.finish()
	}

	fn merged_removals(&self) -> Vec<Span> {
		let mut removals = self.removals.clone();
		removals.sort();

		let mut merged: Vec<Span> = Vec::with_capacity(removals.len());
		for span in removals {
			match merged.last_mut() {
				Some(last) if span.start <= last.end => {
					last.end = last.end.max(span.end);
				}
				_ => merged.push(span),
			}
		}
		merged
	}
}

/// The rendered output of a [`TextEditor`].
#[derive(Debug, Clone)]
pub struct Rendered {
	pub code: String,
	pub map: PositionMap,
}

/// A map from output byte offsets back to input byte offsets, built from
/// the retained source segments of a render.
///
/// Inserted marker text has no input counterpart and maps to `None`; every
/// byte copied from the source is recoverable exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMap {
	pub segments: Vec<MappedSegment>,
}

/// One run of source text retained verbatim in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedSegment {
	pub output_start: usize,
	pub input_start: usize,
	pub len: usize,
}

impl PositionMap {
	/// Map an output offset back to the input offset it was copied from, or
	/// `None` for inserted text.
	pub fn input_offset(&self, output: usize) -> Option<usize> {
		let idx = self
			.segments
			.partition_point(|segment| segment.output_start <= output);
		let segment = self.segments.get(idx.checked_sub(1)?)?;

		(output < segment.output_start + segment.len)
			.then(|| segment.input_start + (output - segment.output_start))
	}
}

/// Single-pass render state: walks the source forward, skipping removed
/// ranges and interleaving insertions, while recording retained segments.
struct Renderer<'a> {
	source: &'a str,
	removals: Vec<Span>,
	removal_index: usize,
	cursor: usize,
	code: String,
	segments: Vec<MappedSegment>,
}

impl<'a> Renderer<'a> {
	fn new(source: &'a str, removals: Vec<Span>) -> Self {
		Self {
			source,
			removals,
			removal_index: 0,
			cursor: 0,
			code: String::with_capacity(source.len()),
			segments: Vec::new(),
		}
	}

	/// Emit retained source text up to input offset `to`.
	fn emit_until(&mut self, to: usize) {
		while self.cursor < to {
			while self
				.removals
				.get(self.removal_index)
				.is_some_and(|removal| removal.end <= self.cursor)
			{
				self.removal_index += 1;
			}

			let next_removal = self.removals.get(self.removal_index).copied();
			if let Some(removal) = next_removal {
				if removal.start <= self.cursor {
					// Inside a removed range: skip forward without emitting.
					self.cursor = removal.end.min(to);
					continue;
				}
			}

			let stop = next_removal.map_or(to, |removal| removal.start.min(to));
			if stop > self.cursor {
				self.push_segment(self.cursor, stop);
				self.code.push_str(&self.source[self.cursor..stop]);
				self.cursor = stop;
			}
		}
	}

	fn insert(&mut self, text: &str) {
		self.code.push_str(text);
	}

	fn push_segment(&mut self, input_start: usize, input_end: usize) {
		let len = input_end - input_start;
		let output_start = self.code.len();

		// Extend the previous segment when both sides are contiguous.
		if let Some(last) = self.segments.last_mut() {
			if last.input_start + last.len == input_start
				&& last.output_start + last.len == output_start
			{
				last.len += len;
				return;
			}
		}

		self.segments.push(MappedSegment {
			output_start,
			input_start,
			len,
		});
	}

	fn finish(self) -> Rendered {
		Rendered {
			code: self.code,
			map: PositionMap {
				segments: self.segments,
			},
		}
	}
}
