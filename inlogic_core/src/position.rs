use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

/// A half-open byte range into the source text.
///
/// Every node, attribute, and embedded expression produced by the
/// [`parser`](crate::parser) carries a `Span` so that the transform can copy
/// expression source verbatim and delete marker attributes without touching
/// any surrounding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
	/// Byte offset of the first byte covered by the span.
	pub start: usize,
	/// Byte offset one past the last byte covered by the span.
	pub end: usize,
}

impl Span {
	pub fn new(start: usize, end: usize) -> Self {
		Self { start, end }
	}

	pub fn len(&self) -> usize {
		self.end - self.start
	}

	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	pub fn range(&self) -> Range<usize> {
		self.start..self.end
	}

	/// Slice the covered text out of the source.
	pub fn slice<'a>(&self, source: &'a str) -> &'a str {
		&source[self.range()]
	}
}

impl From<Range<usize>> for Span {
	fn from(range: Range<usize>) -> Self {
		Self::new(range.start, range.end)
	}
}

/// Pre-computed table of line-start byte offsets for efficient offset-to-
/// line/column conversion. Instead of scanning the entire string for each
/// offset (O(n*m)), we build this table once (O(n)) and use binary search
/// (O(log n)) per lookup.
#[derive(Debug)]
pub struct LineIndex {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineIndex {
	pub fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// Convert a byte offset to a 1-indexed `(line, column)` pair.
	pub fn line_col(&self, offset: usize) -> (usize, usize) {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};
		let line = line_idx + 1;
		let column = offset - self.line_starts[line_idx] + 1;

		(line, column)
	}
}
