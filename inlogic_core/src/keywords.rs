use std::fmt::Display;

use crate::InlogicError;
use crate::InlogicResult;
use crate::Span;
use crate::parser::AttributePart;
use crate::parser::AttributeValue;
use crate::parser::Element;

/// The fixed one-character prefix that marks an attribute as a logic
/// keyword, e.g. `:if={condition}`.
pub const KEYWORD_PREFIX: char = ':';

/// The recognized marker-attribute vocabulary. No other attribute name is
/// interpreted by the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordName {
	If,
	Else,
	ElseIf,
	Each,
	As,
	Key,
	Await,
	Then,
	Catch,
}

impl KeywordName {
	/// Decode an attribute name into a keyword: the name must start with
	/// [`KEYWORD_PREFIX`] and its suffix must be one of the recognized
	/// keywords. Anything else is an ordinary attribute.
	pub fn from_attribute(name: &str) -> Option<Self> {
		let suffix = name.strip_prefix(KEYWORD_PREFIX)?;
		match suffix {
			"if" => Some(Self::If),
			"else" => Some(Self::Else),
			"else-if" => Some(Self::ElseIf),
			"each" => Some(Self::Each),
			"as" => Some(Self::As),
			"key" => Some(Self::Key),
			"await" => Some(Self::Await),
			"then" => Some(Self::Then),
			"catch" => Some(Self::Catch),
			_ => None,
		}
	}
}

impl Display for KeywordName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::If => write!(f, "if"),
			Self::Else => write!(f, "else"),
			Self::ElseIf => write!(f, "else-if"),
			Self::Each => write!(f, "each"),
			Self::As => write!(f, "as"),
			Self::Key => write!(f, "key"),
			Self::Await => write!(f, "await"),
			Self::Then => write!(f, "then"),
			Self::Catch => write!(f, "catch"),
		}
	}
}

/// The decoded value of a marker attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordValue {
	/// The marker was present with no value (`:else`): the boolean-true
	/// sentinel.
	True,
	/// The span of the single embedded expression, copied verbatim into the
	/// emitted block marker.
	Expression(Span),
}

/// A decoded marker-attribute instance found on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
	pub name: KeywordName,
	/// The span of the whole attribute text (`:if={x}`), deleted from the
	/// output when the keyword joins an emitted block.
	pub key_span: Span,
	pub value: KeywordValue,
}

/// Extract all marker keywords from one element, in attribute order.
///
/// A marker attribute with a value must contain exactly one embedded
/// expression; a value with none (`:if="plain"`) or more than one is a
/// malformed marker and aborts the transform.
pub fn extract_keywords(element: &Element) -> InlogicResult<Vec<Keyword>> {
	let mut keywords = Vec::new();

	for attribute in &element.attributes {
		let Some(name) = KeywordName::from_attribute(&attribute.name) else {
			continue;
		};

		let value = match &attribute.value {
			AttributeValue::True => KeywordValue::True,
			AttributeValue::Parts(parts) => {
				let mut expressions = parts.iter().filter_map(|part| {
					match part {
						AttributePart::Expression(span) => Some(*span),
						AttributePart::Text(_) => None,
					}
				});

				match (expressions.next(), expressions.next()) {
					(Some(span), None) => KeywordValue::Expression(span),
					_ => {
						return Err(InlogicError::MalformedKeyword {
							name: attribute.name.clone(),
							span: attribute.span,
						});
					}
				}
			}
		};

		keywords.push(Keyword {
			name,
			key_span: attribute.span,
			value,
		});
	}

	Ok(keywords)
}

/// The source text a keyword contributes to an emitted marker: the literal
/// `true` for bare markers, otherwise the expression substring verbatim.
pub fn keyword_source<'a>(source: &'a str, keyword: &Keyword) -> &'a str {
	match keyword.value {
		KeywordValue::True => "true",
		KeywordValue::Expression(span) => span.slice(source),
	}
}
