//! `inlogic_core` is the core library for the `inlogic` preprocessor. It
//! rewrites markup that carries inline logic *marker attributes* into
//! explicit block syntax, deleting the markers and leaving every other byte
//! of the document untouched.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markup text
//!   → Lexer (logos tokens with byte spans)
//!   → Parser (element tree: nodes, attributes, embedded expressions)
//!   → Keyword extractor (decodes `:if` / `:each` / `:await` / … markers)
//!   → Block state machine (one open block per scope, implicit finalize)
//!   → Block emitter (opening/continuation/closing marker edits)
//!   → Text editor (ordering-sensitive edits → output text + position map)
//! ```
//!
//! ## Marker vocabulary
//!
//! `:if`, `:else`, `:else-if`, `:each`, `:as`, `:key`, `:await`, `:then`,
//! `:catch`. A marker's value is either absent (the boolean-true sentinel)
//! or exactly one embedded `{expression}`, copied verbatim into the emitted
//! block marker.
//!
//! ## Quick Start
//!
//! ```rust
//! use inlogic_core::preprocess;
//!
//! let source = r"<p :if={visible}>hello</p>";
//! let result = preprocess(source).unwrap();
//! assert_eq!(result.code, "{#if visible}<p >hello</p>{/if}");
//! ```
//!
//! Expressions are never parsed or validated: the transform only checks
//! structural keyword legality (pairing, placement, and the ambiguous-await
//! shorthand) and copies expression source by offset range.

pub use blocks::*;
pub use editor::*;
pub use error::*;
pub use keywords::*;
pub use parser::*;
pub use position::*;
pub use transform::*;

mod blocks;
mod editor;
mod error;
mod keywords;
pub(crate) mod lexer;
mod parser;
mod position;
mod transform;

#[cfg(test)]
mod __tests;
