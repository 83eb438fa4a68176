use miette::Diagnostic;
use thiserror::Error;

use crate::Span;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum InlogicError {
	#[error(transparent)]
	#[diagnostic(code(inlogic::io_error))]
	Io(#[from] std::io::Error),

	#[error("syntax error at offset {offset}: {message}")]
	#[diagnostic(code(inlogic::syntax))]
	Syntax { message: String, offset: usize },

	#[error("marker attribute `{name}` must carry exactly one embedded expression")]
	#[diagnostic(
		code(inlogic::malformed_keyword),
		help("write `{name}={{expression}}`, or drop the value for bare markers like `:else`")
	)]
	MalformedKeyword { name: String, span: Span },

	#[error("ambiguous await shorthand: `:then` and `:catch` cannot both sit on the `:await` element")]
	#[diagnostic(
		code(inlogic::ambiguous_await_shorthand),
		help("move `:then` or `:catch` onto a following sibling element")
	)]
	AmbiguousAwaitShorthand { span: Span },

	#[error("`:each` requires an `:as` binding on the same element")]
	#[diagnostic(
		code(inlogic::missing_each_binding),
		help("add `:as={{item}}` next to the `:each` attribute")
	)]
	MissingEachBinding { span: Span },
}

impl InlogicError {
	/// The byte offset the error points at, when one is known.
	pub fn offset(&self) -> Option<usize> {
		match self {
			Self::Io(_) => None,
			Self::Syntax { offset, .. } => Some(*offset),
			Self::MalformedKeyword { span, .. }
			| Self::AmbiguousAwaitShorthand { span }
			| Self::MissingEachBinding { span } => Some(span.start),
		}
	}
}

pub type InlogicResult<T> = Result<T, InlogicError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
