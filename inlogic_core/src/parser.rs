use crate::InlogicError;
use crate::InlogicResult;
use crate::Span;
use crate::lexer::RawToken;
use crate::lexer::SpannedToken;
use crate::lexer::tokenize;

/// Stable element identifier assigned in document order during parsing.
///
/// Scopes are keyed by the parent element's id (see
/// [`ScopeRegistry`](crate::ScopeRegistry)), which replaces the original
/// implementation's reliance on garbage-collected object identity.
pub type NodeId = usize;

/// Parse markup content into a [`Document`] tree with byte-offset spans on
/// every node, attribute, and embedded expression.
pub fn parse(content: impl AsRef<str>) -> InlogicResult<Document> {
	let content = content.as_ref();
	let mut parser = Parser::new(content);
	let children = parser.parse_nodes(None)?;

	Ok(Document { children })
}

/// A parsed markup document: the ordered list of top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	pub children: Vec<Node>,
}

/// A node in the markup tree.
///
/// Only [`Node::Element`] carries structure the transform inspects; text,
/// comments, and top-level `{expression}` mustaches are opaque leaf spans
/// that pass through the transform byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Element(Element),
	/// A run of plain text (including any bytes the lexer could not match).
	Text(Span),
	/// An HTML comment, `<!-- ... -->`, including its delimiters.
	Comment(Span),
	/// A top-level `{expression}` mustache, including its braces.
	Mustache(Span),
}

/// A markup element together with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
	/// Document-order id; used as the scope key for this element's children.
	pub id: NodeId,
	/// Tag name as written in the source.
	pub name: String,
	/// Attributes in document order.
	pub attributes: Vec<Attribute>,
	/// Child nodes in document order. Empty for void and self-closing
	/// elements.
	pub children: Vec<Node>,
	/// The whole element, from `<` to the end of its closing tag (or of the
	/// self-closing `/>`).
	pub span: Span,
}

/// A single attribute: its name, the span of the whole `name=value` text
/// (which is what gets deleted for marker attributes), and its decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name: String,
	pub span: Span,
	pub value: AttributeValue,
}

/// The decoded value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
	/// A bare attribute with no `=value`: the boolean-true sentinel.
	True,
	/// The ordered parts of the value: literal text and `{expression}`
	/// mustaches. An unquoted `attr={expr}` value is a single expression
	/// part; a quoted value may interleave text and expressions.
	Parts(Vec<AttributePart>),
}

/// One segment of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributePart {
	/// Literal text.
	Text(Span),
	/// The span of the expression *inside* a `{...}` mustache, braces
	/// excluded, so the transform can copy it verbatim.
	Expression(Span),
}

/// Elements that never have children or a closing tag.
fn is_void_element(name: &str) -> bool {
	matches!(
		name,
		"area"
			| "base"
			| "br"
			| "col"
			| "embed"
			| "hr"
			| "img"
			| "input"
			| "link"
			| "meta"
			| "source"
			| "track"
			| "wbr"
	)
}

/// Elements whose content is raw text: no child elements are parsed until
/// the matching closing tag.
fn is_raw_text_element(name: &str) -> bool {
	matches!(name, "script" | "style")
}

/// Recursive-descent parser over the spanned raw-token stream.
struct Parser<'a> {
	source: &'a str,
	tokens: Vec<SpannedToken>,
	cursor: usize,
	next_id: NodeId,
}

impl<'a> Parser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			tokens: tokenize(source),
			cursor: 0,
			next_id: 0,
		}
	}

	fn peek(&self) -> Option<&SpannedToken> {
		self.tokens.get(self.cursor)
	}

	fn peek_kind(&self) -> Option<Result<RawToken, ()>> {
		self.peek().map(|(token, _)| *token)
	}

	/// The token at `cursor + offset`, if any.
	fn peek_at(&self, offset: usize) -> Option<&SpannedToken> {
		self.tokens.get(self.cursor + offset)
	}

	fn is_ident_at(&self, offset: usize) -> bool {
		matches!(self.peek_at(offset), Some((Ok(RawToken::Ident), _)))
	}

	fn advance(&mut self) {
		self.cursor += 1;
	}

	/// Consume the current token and return its span.
	fn bump(&mut self) -> Span {
		let span = self.tokens[self.cursor].1.clone();
		self.cursor += 1;
		span.into()
	}

	fn skip_whitespace(&mut self) {
		while matches!(self.peek_kind(), Some(Ok(RawToken::Whitespace))) {
			self.advance();
		}
	}

	fn syntax_error(message: impl Into<String>, offset: usize) -> InlogicError {
		InlogicError::Syntax {
			message: message.into(),
			offset,
		}
	}

	/// Parse a sibling list. When `closing` is `Some(name)`, stop (without
	/// consuming) at the matching `</name`; reaching any other closing tag or
	/// the end of input first is a syntax error.
	fn parse_nodes(&mut self, closing: Option<&str>) -> InlogicResult<Vec<Node>> {
		let mut nodes = Vec::new();
		let mut text_start: Option<usize> = None;

		loop {
			let Some((token, span)) = self.peek() else {
				if let Some(name) = closing {
					return Err(Self::syntax_error(
						format!("unclosed element `<{name}>`"),
						self.source.len(),
					));
				}
				Self::flush_text(&mut nodes, &mut text_start, self.source.len());
				break;
			};

			let token = *token;
			let span_start = span.start;
			match token {
				Ok(RawToken::CloseTagOpen) if self.is_ident_at(1) => {
					Self::flush_text(&mut nodes, &mut text_start, span_start);
					let found = self.close_tag_name(1);
					match closing {
						Some(name) if found == Some(name) => break,
						_ => {
							let found = found.unwrap_or_default().to_string();
							return Err(Self::syntax_error(
								format!("unexpected closing tag `</{found}>`"),
								span_start,
							));
						}
					}
				}
				Ok(RawToken::TagOpen) if self.is_ident_at(1) => {
					Self::flush_text(&mut nodes, &mut text_start, span_start);
					nodes.push(self.parse_element()?);
				}
				Ok(RawToken::CommentOpen) => {
					Self::flush_text(&mut nodes, &mut text_start, span_start);
					nodes.push(self.parse_comment()?);
				}
				Ok(RawToken::BraceOpen) => {
					Self::flush_text(&mut nodes, &mut text_start, span_start);
					let (_, full) = self.scan_mustache()?;
					nodes.push(Node::Mustache(full));
				}
				// Everything else is text, coalesced into one span.
				_ => {
					if text_start.is_none() {
						text_start = Some(span_start);
					}
					self.advance();
				}
			}
		}

		Ok(nodes)
	}

	fn flush_text(nodes: &mut Vec<Node>, text_start: &mut Option<usize>, end: usize) {
		if let Some(start) = text_start.take() {
			if start < end {
				nodes.push(Node::Text(Span::new(start, end)));
			}
		}
	}

	/// The tag name of a closing tag whose `</` token sits just before the
	/// token at `cursor + ident_offset`.
	fn close_tag_name(&self, ident_offset: usize) -> Option<&'a str> {
		let (token, span) = self.peek_at(ident_offset)?;
		if (*token).ok()? != RawToken::Ident {
			return None;
		}
		Some(&self.source[span.clone()])
	}

	fn parse_element(&mut self) -> InlogicResult<Node> {
		let open = self.bump(); // `<`
		let name_span = self.bump(); // tag name
		let name = name_span.slice(self.source).to_string();
		let id = self.next_id;
		self.next_id += 1;

		let mut attributes = Vec::new();
		let tag_end;
		loop {
			self.skip_whitespace();
			match self.peek_kind() {
				Some(Ok(RawToken::SelfCloseEnd)) => {
					let end = self.bump();
					return Ok(Node::Element(Element {
						id,
						name,
						attributes,
						children: Vec::new(),
						span: Span::new(open.start, end.end),
					}));
				}
				Some(Ok(RawToken::TagEnd)) => {
					tag_end = self.bump();
					break;
				}
				Some(Ok(RawToken::Ident)) => {
					attributes.push(self.parse_attribute()?);
				}
				Some(Ok(_) | Err(())) => {
					let offset = self.peek().map_or(self.source.len(), |(_, s)| s.start);
					return Err(Self::syntax_error(
						format!("unexpected token inside `<{name}>` tag"),
						offset,
					));
				}
				None => {
					return Err(Self::syntax_error(
						format!("unclosed tag `<{name}`"),
						self.source.len(),
					));
				}
			}
		}

		if is_void_element(&name) {
			return Ok(Node::Element(Element {
				id,
				name,
				attributes,
				children: Vec::new(),
				span: Span::new(open.start, tag_end.end),
			}));
		}

		let children = if is_raw_text_element(&name) {
			self.parse_raw_text(&name)?
		} else {
			self.parse_nodes(Some(&name))?
		};

		let close_end = self.consume_closing_tag(&name)?;

		Ok(Node::Element(Element {
			id,
			name,
			attributes,
			children,
			span: Span::new(open.start, close_end),
		}))
	}

	/// Consume `</name>` and return the end offset of the closing `>`.
	fn consume_closing_tag(&mut self, name: &str) -> InlogicResult<usize> {
		let open_offset = self.peek().map_or(self.source.len(), |(_, s)| s.start);
		if !matches!(self.peek_kind(), Some(Ok(RawToken::CloseTagOpen))) {
			return Err(Self::syntax_error(
				format!("unclosed element `<{name}>`"),
				open_offset,
			));
		}
		self.advance();

		let found = self.close_tag_name(0).unwrap_or_default().to_string();
		if found != name {
			return Err(Self::syntax_error(
				format!("mismatched closing tag: expected `</{name}>`, found `</{found}>`"),
				open_offset,
			));
		}
		self.advance();
		self.skip_whitespace();

		if !matches!(self.peek_kind(), Some(Ok(RawToken::TagEnd))) {
			return Err(Self::syntax_error(
				format!("malformed closing tag `</{found}`"),
				open_offset,
			));
		}

		Ok(self.bump().end)
	}

	/// Scan the content of a raw-text element (`script`/`style`): everything
	/// up to the matching `</name` is a single text node.
	fn parse_raw_text(&mut self, name: &str) -> InlogicResult<Vec<Node>> {
		let start = self.peek().map_or(self.source.len(), |(_, s)| s.start);
		let mut end = start;

		loop {
			match self.peek() {
				None => {
					return Err(Self::syntax_error(
						format!("unclosed element `<{name}>`"),
						self.source.len(),
					));
				}
				Some((Ok(RawToken::CloseTagOpen), span))
					if self.close_tag_name(1) == Some(name) =>
				{
					end = span.start;
					break;
				}
				Some((_, span)) => {
					end = span.end;
					self.advance();
				}
			}
		}

		if start < end {
			Ok(vec![Node::Text(Span::new(start, end))])
		} else {
			Ok(Vec::new())
		}
	}

	fn parse_attribute(&mut self) -> InlogicResult<Attribute> {
		let name_span = self.bump();
		let name = name_span.slice(self.source).to_string();

		self.skip_whitespace();
		if !matches!(self.peek_kind(), Some(Ok(RawToken::Equals))) {
			return Ok(Attribute {
				name,
				span: name_span,
				value: AttributeValue::True,
			});
		}
		self.advance();
		self.skip_whitespace();

		let (value, end) = self.parse_attribute_value(&name)?;

		Ok(Attribute {
			name,
			span: Span::new(name_span.start, end),
			value,
		})
	}

	fn parse_attribute_value(&mut self, name: &str) -> InlogicResult<(AttributeValue, usize)> {
		match self.peek_kind() {
			Some(Ok(RawToken::BraceOpen)) => {
				let (inner, full) = self.scan_mustache()?;
				let parts = vec![AttributePart::Expression(inner)];
				Ok((AttributeValue::Parts(parts), full.end))
			}
			Some(Ok(RawToken::DoubleQuote)) => self.parse_quoted_value(b'"'),
			Some(Ok(RawToken::SingleQuote)) => self.parse_quoted_value(b'\''),
			// Bare value: a run of idents and unrecognized bytes up to the
			// next whitespace or tag delimiter.
			Some(Ok(RawToken::Ident) | Err(())) => {
				let start = self.bump();
				let mut end = start.end;
				while matches!(self.peek_kind(), Some(Ok(RawToken::Ident) | Err(()))) {
					end = self.bump().end;
				}
				let parts = vec![AttributePart::Text(Span::new(start.start, end))];
				Ok((AttributeValue::Parts(parts), end))
			}
			_ => {
				let offset = self.peek().map_or(self.source.len(), |(_, s)| s.start);
				Err(Self::syntax_error(
					format!("expected a value for attribute `{name}`"),
					offset,
				))
			}
		}
	}

	/// Parse a quoted attribute value, splitting its content into text and
	/// `{expression}` parts.
	fn parse_quoted_value(&mut self, quote: u8) -> InlogicResult<(AttributeValue, usize)> {
		let open = self.bump();
		let Some(close) = self.find_quote(open.end, quote) else {
			return Err(Self::syntax_error("unterminated string", open.start));
		};

		let content = Span::new(open.end, close);
		let parts = self.quoted_value_parts(content)?;
		self.resync_to(close + 1);

		Ok((AttributeValue::Parts(parts), close + 1))
	}

	/// Byte-scan a quoted value's content for embedded `{expression}`
	/// mustaches, producing interleaved text and expression parts.
	fn quoted_value_parts(&self, content: Span) -> InlogicResult<Vec<AttributePart>> {
		let bytes = self.source.as_bytes();
		let mut parts = Vec::new();
		let mut pos = content.start;
		let mut text_start = content.start;

		while pos < content.end {
			if bytes[pos] != b'{' {
				pos += 1;
				continue;
			}

			if pos > text_start {
				parts.push(AttributePart::Text(Span::new(text_start, pos)));
			}

			let mut depth = 1usize;
			let mut cursor = pos + 1;
			while cursor < content.end && depth > 0 {
				match bytes[cursor] {
					b'{' => depth += 1,
					b'}' => depth -= 1,
					quote @ (b'"' | b'\'') => {
						let Some(close) = self.find_quote(cursor + 1, quote) else {
							return Err(Self::syntax_error("unterminated string", cursor));
						};
						cursor = close;
					}
					_ => {}
				}
				cursor += 1;
			}
			if depth > 0 {
				return Err(Self::syntax_error("unterminated expression", pos));
			}

			parts.push(AttributePart::Expression(Span::new(pos + 1, cursor - 1)));
			pos = cursor;
			text_start = cursor;
		}

		if text_start < content.end {
			parts.push(AttributePart::Text(Span::new(text_start, content.end)));
		}

		Ok(parts)
	}

	/// Scan a balanced `{...}` mustache starting at the current `{` token.
	/// Returns the inner expression span (braces excluded) and the full span.
	fn scan_mustache(&mut self) -> InlogicResult<(Span, Span)> {
		let open = self.bump();
		let inner_start = open.end;
		let mut depth = 1usize;

		loop {
			match self.peek() {
				None => {
					return Err(Self::syntax_error("unterminated expression", open.start));
				}
				Some((Ok(RawToken::BraceOpen), _)) => {
					depth += 1;
					self.advance();
				}
				Some((Ok(RawToken::BraceClose), span)) => {
					depth -= 1;
					if depth == 0 {
						let inner = Span::new(inner_start, span.start);
						let full = Span::new(open.start, span.end);
						self.advance();
						return Ok((inner, full));
					}
					self.advance();
				}
				// String literals inside the expression: braces within them
				// must not affect the depth count.
				Some((Ok(RawToken::DoubleQuote), span)) => {
					let from = span.end;
					let Some(close) = self.find_quote(from, b'"') else {
						return Err(Self::syntax_error("unterminated string", span.start));
					};
					self.resync_to(close + 1);
				}
				Some((Ok(RawToken::SingleQuote), span)) => {
					let from = span.end;
					let Some(close) = self.find_quote(from, b'\'') else {
						return Err(Self::syntax_error("unterminated string", span.start));
					};
					self.resync_to(close + 1);
				}
				Some(_) => self.advance(),
			}
		}
	}

	/// Consume an HTML comment. The terminator is found with a byte scan
	/// rather than by looking for a `-->` token: comment text ending in
	/// `abc-->` lexes the dashes into the preceding ident, so the closing
	/// token is not guaranteed to exist.
	fn parse_comment(&mut self) -> InlogicResult<Node> {
		let open = self.bump();
		let Some(close) = self.source[open.end..].find("-->") else {
			return Err(Self::syntax_error("unterminated comment", open.start));
		};

		let end = open.end + close + "-->".len();
		self.resync_to(end);

		Ok(Node::Comment(Span::new(open.start, end)))
	}

	/// Find the next unescaped `quote` byte at or after `from`.
	fn find_quote(&self, from: usize, quote: u8) -> Option<usize> {
		let bytes = self.source.as_bytes();
		let mut pos = from;
		while pos < bytes.len() {
			match bytes[pos] {
				b'\\' => pos += 2,
				byte if byte == quote => return Some(pos),
				_ => pos += 1,
			}
		}
		None
	}

	/// Move the token cursor to the first token starting at or after
	/// `offset`. Used after byte-level string scans; tokens partition the
	/// source, so this always lands on a token boundary.
	fn resync_to(&mut self, offset: usize) {
		while self
			.peek()
			.is_some_and(|(_, span)| span.start < offset)
		{
			self.advance();
		}
	}
}
