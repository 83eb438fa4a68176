use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for flat tokenization of markup text.
///
/// The lexer only knows about the structural punctuation the parser cares
/// about. Everything logos cannot match surfaces as an error token and is
/// treated as plain text by the parser, so prose, entities, and arbitrary
/// bytes pass through untouched.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawToken {
	#[token("<!--")]
	CommentOpen,
	#[token("-->")]
	CommentClose,
	#[token("</")]
	CloseTagOpen,
	#[token("<")]
	TagOpen,
	#[token("/>")]
	SelfCloseEnd,
	#[token(">")]
	TagEnd,
	#[token("=")]
	Equals,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	// Quotes are single-byte tokens rather than full string regexes: a lone
	// apostrophe in prose must not swallow markup up to the next apostrophe.
	// The parser pairs quotes itself in the contexts where strings exist
	// (attribute values and expressions).
	#[token("\"")]
	DoubleQuote,
	#[token("'")]
	SingleQuote,
	#[regex(r"[a-zA-Z_:][a-zA-Z0-9_:.\-]*")]
	Ident,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
}

/// A raw token (or an unrecognized-byte error) together with its byte span.
pub(crate) type SpannedToken = (Result<RawToken, ()>, Range<usize>);

/// Tokenize the whole source up front. Tokens partition the input: spans are
/// contiguous and non-overlapping, which the parser relies on when it resyncs
/// the token cursor after byte-level string scans.
pub(crate) fn tokenize(source: &str) -> Vec<SpannedToken> {
	RawToken::lexer(source).spanned().collect()
}
