use crate::InlogicError;
use crate::InlogicResult;
use crate::blocks::AwaitBlock;
use crate::blocks::Block;
use crate::blocks::EachBlock;
use crate::blocks::IfBlock;
use crate::blocks::KeyBlock;
use crate::blocks::Part;
use crate::blocks::ScopeKey;
use crate::blocks::ScopeRegistry;
use crate::editor::PositionMap;
use crate::editor::TextEditor;
use crate::keywords::Keyword;
use crate::keywords::KeywordName;
use crate::keywords::KeywordValue;
use crate::keywords::extract_keywords;
use crate::keywords::keyword_source;
use crate::parser::Document;
use crate::parser::Element;
use crate::parser::Node;
use crate::parser::parse;

/// The result of a successful transform: the rewritten markup and the map
/// from output byte offsets back to input byte offsets.
#[derive(Debug, Clone)]
pub struct Preprocessed {
	pub code: String,
	pub map: PositionMap,
}

/// Parse `source` and rewrite all marker attributes into block syntax.
pub fn preprocess(source: impl AsRef<str>) -> InlogicResult<Preprocessed> {
	let source = source.as_ref();
	let document = parse(source)?;
	transform(source, &document)
}

/// Rewrite marker attributes into block syntax against an already-parsed
/// tree. The tree must have been parsed from this exact `source`: every
/// span is resolved against it.
pub fn transform(source: &str, document: &Document) -> InlogicResult<Preprocessed> {
	let mut transformer = Transformer::new(source);
	transformer.visit_children(&document.children, None)?;
	transformer.flush_all()?;

	Ok(transformer.finish())
}

/// Single-pass traversal state: the edit buffer plus the per-scope block
/// state machine. Edits only become output in [`finish`](Self::finish), so
/// any error aborts with no partial output.
struct Transformer<'a> {
	source: &'a str,
	editor: TextEditor,
	scopes: ScopeRegistry,
}

impl<'a> Transformer<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			editor: TextEditor::new(),
			scopes: ScopeRegistry::new(),
		}
	}

	/// Visit a sibling list depth-first in document order. After the last
	/// element child of the list has been entered (and before descending
	/// into it), the scope is force-finalized so a block can never leak past
	/// the end of its enclosing children list.
	fn visit_children(&mut self, children: &[Node], scope: ScopeKey) -> InlogicResult<()> {
		let last_element = children.iter().rev().find_map(|node| {
			match node {
				Node::Element(element) => Some(element.id),
				_ => None,
			}
		});

		for node in children {
			let Node::Element(element) = node else {
				continue;
			};

			self.enter_element(element, scope)?;
			if last_element == Some(element.id) {
				self.finalize_scope(scope)?;
			}
			self.visit_children(&element.children, Some(element.id))?;
		}

		Ok(())
	}

	fn enter_element(&mut self, element: &Element, scope: ScopeKey) -> InlogicResult<()> {
		for keyword in extract_keywords(element)? {
			self.apply_keyword(scope, element, keyword)?;
		}

		Ok(())
	}

	/// One state-machine transition: feed a keyword into its scope. Opening
	/// keywords implicitly finalize whatever block is currently open;
	/// continuation keywords attach when a matching block is open and are
	/// discarded otherwise.
	fn apply_keyword(
		&mut self,
		scope: ScopeKey,
		element: &Element,
		keyword: Keyword,
	) -> InlogicResult<()> {
		let node = element.id;
		let part = Part {
			node,
			span: element.span,
			keyword,
		};
		let open = self.scopes.scope_mut(scope).open.take();

		let next = match (part.keyword.name, open) {
			(KeywordName::If, open) => {
				self.finalize(open)?;
				Some(Block::If(IfBlock::new(part)))
			}
			(KeywordName::ElseIf, Some(Block::If(mut block))) => {
				block.else_ifs.push(part);
				Some(Block::If(block))
			}
			(KeywordName::ElseIf, open) => {
				self.finalize(open)?;
				self.discard(&part.keyword);
				None
			}
			(KeywordName::Else, Some(Block::If(mut block))) => {
				block.r#else = Some(part);
				self.finalize(Some(Block::If(block)))?;
				None
			}
			(KeywordName::Else, Some(Block::Each(mut block))) => {
				block.r#else = Some(part);
				self.finalize(Some(Block::Each(block)))?;
				None
			}
			(KeywordName::Else, open) => {
				self.finalize(open)?;
				self.discard(&part.keyword);
				None
			}
			(KeywordName::Each, open) => {
				self.finalize(open)?;
				Some(Block::Each(EachBlock::new(part)))
			}
			(KeywordName::As, Some(Block::Each(mut block))) => {
				if block.each.node == node && block.r#as.is_none() {
					block.r#as = Some(part);
				} else {
					self.discard(&part.keyword);
				}
				Some(Block::Each(block))
			}
			(KeywordName::As, open) => {
				self.discard(&part.keyword);
				open
			}
			(KeywordName::Key, Some(Block::Each(mut block))) if block.each.node == node => {
				if block.key.is_none() {
					block.key = Some(part);
				} else {
					self.discard(&part.keyword);
				}
				Some(Block::Each(block))
			}
			(KeywordName::Key, open) => {
				self.finalize(open)?;
				Some(Block::Key(KeyBlock { key: part }))
			}
			(KeywordName::Await, open) => {
				self.finalize(open)?;
				Some(Block::Await(AwaitBlock::new(part)))
			}
			(KeywordName::Then, Some(Block::Await(mut block))) => {
				if block.then.is_none() {
					block.then = Some(part);
				} else {
					self.discard(&part.keyword);
				}
				Some(Block::Await(block))
			}
			(KeywordName::Then, open) => {
				self.discard(&part.keyword);
				open
			}
			(KeywordName::Catch, Some(Block::Await(mut block))) => {
				if block.catch.is_none() {
					let then_on_await = block
						.then
						.as_ref()
						.is_some_and(|then| then.node == node && block.r#await.node == node);
					if then_on_await {
						return Err(InlogicError::AmbiguousAwaitShorthand {
							span: part.keyword.key_span,
						});
					}
					block.catch = Some(part);
				} else {
					self.discard(&part.keyword);
				}
				// A catch always ends its await block.
				self.finalize(Some(Block::Await(block)))?;
				None
			}
			(KeywordName::Catch, open) => {
				self.finalize(open)?;
				self.discard(&part.keyword);
				None
			}
		};

		self.scopes.scope_mut(scope).open = next;

		Ok(())
	}

	/// Close whatever block is open in a scope, if any.
	fn finalize_scope(&mut self, scope: ScopeKey) -> InlogicResult<()> {
		let open = self.scopes.scope_mut(scope).open.take();
		self.finalize(open)
	}

	/// End-of-traversal sweep: finalize every still-open block, in scope
	/// creation order.
	fn flush_all(&mut self) -> InlogicResult<()> {
		for key in self.scopes.keys_in_order() {
			self.finalize_scope(key)?;
		}
		debug_assert!(self.scopes.all_closed());

		Ok(())
	}

	fn finalize(&mut self, block: Option<Block>) -> InlogicResult<()> {
		match block {
			None => Ok(()),
			Some(Block::If(block)) => {
				self.emit_if(block);
				Ok(())
			}
			Some(Block::Each(block)) => self.emit_each(block),
			Some(Block::Await(block)) => {
				self.emit_await(block);
				Ok(())
			}
			Some(Block::Key(block)) => {
				self.emit_key(block);
				Ok(())
			}
		}
	}

	fn emit_if(&mut self, block: IfBlock) {
		let IfBlock {
			r#if,
			else_ifs,
			r#else,
		} = block;

		let condition = keyword_source(self.source, &r#if.keyword);
		self.editor
			.insert_left(r#if.span.start, format!("{{#if {condition}}}"));
		self.remove_keyword(&r#if.keyword);

		for else_if in &else_ifs {
			let condition = keyword_source(self.source, &else_if.keyword);
			self.editor
				.insert_left(else_if.span.start, format!("{{:else if {condition}}}"));
			self.remove_keyword(&else_if.keyword);
		}

		if let Some(else_part) = &r#else {
			self.editor.insert_left(else_part.span.start, "{:else}");
			self.remove_keyword(&else_part.keyword);
		}

		let last_end = r#else
			.as_ref()
			.map(|part| part.span.end)
			.or_else(|| else_ifs.last().map(|part| part.span.end))
			.unwrap_or(r#if.span.end);
		self.editor.insert_right(last_end, "{/if}");
	}

	fn emit_each(&mut self, block: EachBlock) -> InlogicResult<()> {
		let EachBlock {
			each,
			r#as,
			key,
			r#else,
		} = block;

		let Some(r#as) = r#as else {
			return Err(InlogicError::MissingEachBinding {
				span: each.keyword.key_span,
			});
		};

		let collection = keyword_source(self.source, &each.keyword);
		let binding = keyword_source(self.source, &r#as.keyword);
		let opening = match &key {
			Some(key_part) => {
				let identity = keyword_source(self.source, &key_part.keyword);
				format!("{{#each {collection} as {binding} ({identity})}}")
			}
			None => format!("{{#each {collection} as {binding}}}"),
		};
		self.editor.insert_left(each.span.start, opening);
		self.remove_keyword(&each.keyword);
		self.remove_keyword(&r#as.keyword);
		if let Some(key_part) = &key {
			self.remove_keyword(&key_part.keyword);
		}

		if let Some(else_part) = &r#else {
			self.editor.insert_left(else_part.span.start, "{:else}");
			self.remove_keyword(&else_part.keyword);
		}

		let last_end = r#else.as_ref().map_or(each.span.end, |part| part.span.end);
		self.editor.insert_right(last_end, "{/each}");

		Ok(())
	}

	fn emit_await(&mut self, block: AwaitBlock) {
		let AwaitBlock {
			r#await,
			then,
			catch,
		} = block;

		let awaited = keyword_source(self.source, &r#await.keyword);
		let then_shorthand = then.as_ref().is_some_and(|part| part.node == r#await.node);
		let catch_shorthand =
			then.is_none() && catch.as_ref().is_some_and(|part| part.node == r#await.node);

		let opening = if then_shorthand {
			let binding = then
				.as_ref()
				.map_or("", |part| keyword_source(self.source, &part.keyword));
			format!("{{#await {awaited} then {binding}}}")
		} else if catch_shorthand {
			let binding = catch
				.as_ref()
				.map_or("", |part| keyword_source(self.source, &part.keyword));
			format!("{{#await {awaited} catch {binding}}}")
		} else {
			format!("{{#await {awaited}}}")
		};
		self.editor.insert_left(r#await.span.start, opening);
		self.remove_keyword(&r#await.keyword);

		if let Some(then_part) = &then {
			if !then_shorthand {
				let binding = keyword_source(self.source, &then_part.keyword);
				self.editor
					.insert_left(then_part.span.start, format!("{{:then {binding}}}"));
			}
			self.remove_keyword(&then_part.keyword);
		}

		if let Some(catch_part) = &catch {
			if !catch_shorthand {
				let marker = match catch_part.keyword.value {
					KeywordValue::True => "{:catch}".to_string(),
					KeywordValue::Expression(_) => {
						let binding = keyword_source(self.source, &catch_part.keyword);
						format!("{{:catch {binding}}}")
					}
				};
				self.editor.insert_left(catch_part.span.start, marker);
			}
			self.remove_keyword(&catch_part.keyword);
		}

		let last_end = catch
			.as_ref()
			.map(|part| part.span.end)
			.or_else(|| then.as_ref().map(|part| part.span.end))
			.unwrap_or(r#await.span.end);
		self.editor.insert_right(last_end, "{/await}");
	}

	fn emit_key(&mut self, block: KeyBlock) {
		let KeyBlock { key } = block;

		let identity = keyword_source(self.source, &key.keyword);
		self.editor
			.insert_left(key.span.start, format!("{{#key {identity}}}"));
		self.editor.insert_right(key.span.end, "{/key}");
		self.remove_keyword(&key.keyword);
	}

	fn remove_keyword(&mut self, keyword: &Keyword) {
		self.editor.remove(keyword.key_span);
	}

	/// A keyword whose semantic effect is dropped still has its marker text
	/// stripped, so no recognized marker ever survives into the output.
	fn discard(&mut self, keyword: &Keyword) {
		self.remove_keyword(keyword);
	}

	fn finish(self) -> Preprocessed {
		let rendered = self.editor.render(self.source);

		Preprocessed {
			code: rendered.code,
			map: rendered.map,
		}
	}
}
