use rstest::rstest;
use similar_asserts::assert_eq;

use super::*;
use crate::lexer::RawToken;
use crate::lexer::tokenize;

fn first_element(document: &Document) -> &Element {
	match &document.children[0] {
		Node::Element(element) => element,
		other => panic!("expected an element, got {other:?}"),
	}
}

#[test]
fn tokenize_splits_structural_punctuation() {
	let kinds: Vec<_> = tokenize(r#"<p a="x">"#)
		.into_iter()
		.map(|(token, _)| token)
		.collect();

	assert_eq!(kinds, vec![
		Ok(RawToken::TagOpen),
		Ok(RawToken::Ident),
		Ok(RawToken::Whitespace),
		Ok(RawToken::Ident),
		Ok(RawToken::Equals),
		Ok(RawToken::DoubleQuote),
		Ok(RawToken::Ident),
		Ok(RawToken::DoubleQuote),
		Ok(RawToken::TagEnd),
	]);
}

#[test]
fn tokenize_surfaces_unrecognized_bytes_as_errors() {
	let tokens = tokenize("a & b");
	assert_eq!(tokens[2], (Err(()), 2..3));
}

#[rstest]
#[case::bare("<p hidden></p>", AttributeValue::True)]
#[case::expression(
	"<p :if={x}></p>",
	AttributeValue::Parts(vec![AttributePart::Expression(Span::new(8, 9))])
)]
#[case::quoted_mixed(
	r#"<p class="a {b} c"></p>"#,
	AttributeValue::Parts(vec![
		AttributePart::Text(Span::new(10, 12)),
		AttributePart::Expression(Span::new(13, 14)),
		AttributePart::Text(Span::new(15, 17)),
	])
)]
#[case::bare_value(
	"<p class=plain></p>",
	AttributeValue::Parts(vec![AttributePart::Text(Span::new(9, 14))])
)]
fn parse_attribute_values(
	#[case] input: &str,
	#[case] expected: AttributeValue,
) -> InlogicResult<()> {
	let document = parse(input)?;
	let element = first_element(&document);
	assert_eq!(element.attributes[0].value, expected);

	Ok(())
}

#[test]
fn parse_attribute_span_covers_name_and_value() -> InlogicResult<()> {
	let source = "<p :if={x}></p>";
	let document = parse(source)?;
	let attribute = &first_element(&document).attributes[0];

	assert_eq!(attribute.name, ":if");
	assert_eq!(attribute.span, Span::new(3, 10));
	assert_eq!(attribute.span.slice(source), ":if={x}");

	Ok(())
}

#[test]
fn parse_nested_elements_with_spans() -> InlogicResult<()> {
	let source = "<div><p>hi</p></div>";
	let document = parse(source)?;
	let div = first_element(&document);

	assert_eq!(div.name, "div");
	assert_eq!(div.span, Span::new(0, 20));
	assert_eq!(div.children.len(), 1);

	let Node::Element(p) = &div.children[0] else {
		panic!("expected an element child");
	};
	assert_eq!(p.name, "p");
	assert_eq!(p.span, Span::new(5, 14));
	assert_eq!(p.children, vec![Node::Text(Span::new(8, 10))]);

	Ok(())
}

#[test]
fn parse_void_element_has_no_children() -> InlogicResult<()> {
	let document = parse("<img src={pic}>")?;
	let img = first_element(&document);

	assert_eq!(img.name, "img");
	assert_eq!(img.span, Span::new(0, 15));
	assert!(img.children.is_empty());

	Ok(())
}

#[test]
fn parse_self_closing_element() -> InlogicResult<()> {
	let document = parse("<p/>")?;
	let p = first_element(&document);

	assert_eq!(p.span, Span::new(0, 4));
	assert!(p.children.is_empty());

	Ok(())
}

#[test]
fn parse_raw_text_element_keeps_content_opaque() -> InlogicResult<()> {
	let source = "<script>let x = 1 < 2;</script>";
	let document = parse(source)?;
	let script = first_element(&document);

	assert_eq!(script.span, Span::new(0, 31));
	assert_eq!(script.children, vec![Node::Text(Span::new(8, 22))]);

	Ok(())
}

#[test]
fn parse_comment_without_inner_whitespace() -> InlogicResult<()> {
	let document = parse("a<!--no spaces-->c")?;

	assert_eq!(document.children, vec![
		Node::Text(Span::new(0, 1)),
		Node::Comment(Span::new(1, 17)),
		Node::Text(Span::new(17, 18)),
	]);

	Ok(())
}

#[test]
fn parse_top_level_mustache() -> InlogicResult<()> {
	let document = parse("pre {a} post")?;

	assert_eq!(document.children, vec![
		Node::Text(Span::new(0, 4)),
		Node::Mustache(Span::new(4, 7)),
		Node::Text(Span::new(7, 12)),
	]);

	Ok(())
}

#[test]
fn parse_text_with_loose_angle_bracket() -> InlogicResult<()> {
	let document = parse("a < b")?;
	assert_eq!(document.children, vec![Node::Text(Span::new(0, 5))]);

	Ok(())
}

#[rstest]
#[case::unclosed("<div>")]
#[case::mismatched_close("<div></span>")]
#[case::unterminated_expression("<p :if={x></p>")]
#[case::unterminated_comment("<!-- never closed")]
fn parse_rejects_malformed_markup(#[case] input: &str) {
	let error = parse(input).unwrap_err();
	assert!(matches!(error, InlogicError::Syntax { .. }), "got {error:?}");
}

#[test]
fn extract_keywords_in_attribute_order() -> InlogicResult<()> {
	let source = r#"<p id="x" :if={a} class={b} :else></p>"#;
	let document = parse(source)?;
	let keywords = extract_keywords(first_element(&document))?;

	let names: Vec<_> = keywords.iter().map(|keyword| keyword.name).collect();
	assert_eq!(names, vec![KeywordName::If, KeywordName::Else]);

	Ok(())
}

#[test]
fn extract_keywords_rejects_value_without_expression() -> InlogicResult<()> {
	let document = parse(r#"<p :if="plain"></p>"#)?;
	let error = extract_keywords(first_element(&document)).unwrap_err();
	assert!(matches!(error, InlogicError::MalformedKeyword { .. }));

	Ok(())
}

#[test]
fn keyword_source_uses_the_true_sentinel_for_bare_markers() -> InlogicResult<()> {
	let source = "<a :else></a>";
	let document = parse(source)?;
	let keywords = extract_keywords(first_element(&document))?;

	assert_eq!(keyword_source(source, &keywords[0]), "true");

	Ok(())
}

#[test]
fn keyword_source_copies_expressions_verbatim() -> InlogicResult<()> {
	let source = "<a :if={count > 1}></a>";
	let document = parse(source)?;
	let keywords = extract_keywords(first_element(&document))?;

	assert_eq!(keyword_source(source, &keywords[0]), "count > 1");

	Ok(())
}

#[test]
fn editor_left_inserts_keep_insertion_order() {
	let mut editor = TextEditor::new();
	editor.insert_left(3, "one");
	editor.insert_left(3, "two");

	assert_eq!(editor.render("abcdef").code, "abconetwodef");
}

#[test]
fn editor_right_inserts_reverse_insertion_order() {
	let mut editor = TextEditor::new();
	editor.insert_right(3, "one");
	editor.insert_right(3, "two");

	assert_eq!(editor.render("abcdef").code, "abctwoonedef");
}

#[test]
fn editor_left_renders_before_right_at_the_same_offset() {
	let mut editor = TextEditor::new();
	editor.insert_right(3, "right");
	editor.insert_left(3, "left");

	assert_eq!(editor.render("abcdef").code, "abcleftrightdef");
}

#[test]
fn editor_overlapping_removals_coalesce() {
	let mut editor = TextEditor::new();
	editor.remove(Span::new(1, 3));
	editor.remove(Span::new(2, 5));

	assert_eq!(editor.render("abcdef").code, "af");
}

#[test]
fn editor_without_edits_is_the_identity() {
	let rendered = TextEditor::new().render("abc");

	assert_eq!(rendered.code, "abc");
	assert_eq!(rendered.map.input_offset(1), Some(1));
	assert_eq!(rendered.map.input_offset(3), None);
}

#[rstest]
#[case::if_block("<p :if={x}>hello</p>", "{#if x}<p >hello</p>{/if}")]
#[case::bare_marker_uses_true("<a :if></a>", "{#if true}<a ></a>{/if}")]
#[case::expression_copied_verbatim(
	"<a :if={count > 1}></a>",
	"{#if count > 1}<a ></a>{/if}"
)]
#[case::if_chain(
	"<a :if={x}></a><b :else-if={y}></b><c :else></c>",
	"{#if x}<a ></a>{:else if y}<b ></b>{:else}<c ></c>{/if}"
)]
#[case::each_with_key(
	"<d :each={list} :as={item} :key={item.id}></d>",
	"{#each list as item (item.id)}<d   ></d>{/each}"
)]
#[case::each_with_else(
	"<e :each={list} :as={v}></e><f :else></f>",
	"{#each list as v}<e  ></e>{:else}<f ></f>{/each}"
)]
#[case::await_bare("<g :await={p}></g>", "{#await p}<g ></g>{/await}")]
#[case::await_then_shorthand(
	"<g :await={p} :then={val}></g>",
	"{#await p then val}<g  ></g>{/await}"
)]
#[case::await_catch_shorthand(
	"<g :await={p} :catch={e}></g>",
	"{#await p catch e}<g  ></g>{/await}"
)]
#[case::await_long_form(
	"<g :await={p}></g><h :then={val}></h><i :catch></i>",
	"{#await p}<g ></g>{:then val}<h ></h>{:catch}<i ></i>{/await}"
)]
#[case::await_catch_with_binding(
	"<g :await={p}></g><h :then={v}></h><i :catch={err}></i>",
	"{#await p}<g ></g>{:then v}<h ></h>{:catch err}<i ></i>{/await}"
)]
#[case::key_block("<k :key={id}></k>", "{#key id}<k ></k>{/key}")]
#[case::key_finalizes_previous(
	"<a :if={x}></a> <k :key={id}></k>",
	"{#if x}<a ></a>{/if} {#key id}<k ></k>{/key}"
)]
#[case::implicit_finalize_by_new_opener(
	"<a :if={x}></a> <b :each={l} :as={v}></b>",
	"{#if x}<a ></a>{/if} {#each l as v}<b  ></b>{/each}"
)]
#[case::nested_scopes(
	"<ul :if={items.length}><li :each={items} :as={item}>{item}</li></ul>",
	"{#if items.length}<ul >{#each items as item}<li  >{item}</li>{/each}</ul>{/if}"
)]
#[case::sibling_scopes_are_independent(
	"<div><a :if={x}></a></div><section><b :if={y}></b></section>",
	"<div>{#if x}<a ></a>{/if}</div><section>{#if y}<b ></b>{/if}</section>"
)]
#[case::trailing_text_stays_outside_the_block(
	"<a :if={x}></a>\n",
	"{#if x}<a ></a>{/if}\n"
)]
#[case::orphan_else_is_stripped("<a :else></a>", "<a ></a>")]
#[case::orphan_else_if_is_stripped("<b :else-if={y}></b>", "<b ></b>")]
#[case::orphan_then_is_stripped("<a :then={v}></a>", "<a ></a>")]
#[case::then_on_open_if_is_stripped(
	"<a :if={x} :then={v}></a>",
	"{#if x}<a  ></a>{/if}"
)]
#[case::ordinary_attributes_survive(
	r#"<p class="big" :if={x}>hi</p>"#,
	r#"{#if x}<p class="big" >hi</p>{/if}"#
)]
#[case::unrecognized_marker_untouched("<p :data={x}></p>", "<p :data={x}></p>")]
#[case::comments_and_mustaches_untouched(
	"<!-- {a} --><p :if={x}></p>{done}",
	"<!-- {a} -->{#if x}<p ></p>{/if}{done}"
)]
#[case::no_markers_is_the_identity("<p>hello</p>", "<p>hello</p>")]
fn preprocess_rewrites_markers(
	#[case] input: &str,
	#[case] expected: &str,
) -> InlogicResult<()> {
	let result = preprocess(input)?;
	assert_eq!(result.code, expected);

	Ok(())
}

#[test]
fn preprocess_rejects_each_without_binding() {
	let error = preprocess("<d :each={list}></d>").unwrap_err();
	assert!(matches!(error, InlogicError::MissingEachBinding { .. }));
}

#[test]
fn preprocess_rejects_ambiguous_await_shorthand() {
	let error = preprocess("<g :await={p} :then={v} :catch></g>").unwrap_err();
	assert!(matches!(error, InlogicError::AmbiguousAwaitShorthand { .. }));
}

#[test]
fn preprocess_rejects_malformed_marker_value() {
	let error = preprocess(r#"<p :if="plain"></p>"#).unwrap_err();
	assert!(matches!(error, InlogicError::MalformedKeyword { .. }));
}

#[test]
fn position_map_reaches_back_to_input_offsets() -> InlogicResult<()> {
	let result = preprocess("<p :if={x}>hello</p>")?;
	assert_eq!(result.code, "{#if x}<p >hello</p>{/if}");

	// Inserted opening marker.
	assert_eq!(result.map.input_offset(0), None);
	// `<` of the element.
	assert_eq!(result.map.input_offset(7), Some(0));
	// `>` right after the removed marker attribute.
	assert_eq!(result.map.input_offset(10), Some(10));
	// `h` of `hello`.
	assert_eq!(result.map.input_offset(11), Some(11));
	// Inserted closing marker.
	assert_eq!(result.map.input_offset(20), None);

	Ok(())
}

#[test]
fn position_map_serializes_for_sidecar_output() -> AnyEmptyResult {
	let result = preprocess("<p :if={x}></p>")?;
	let json = serde_json::to_string(&result.map)?;
	assert!(json.contains("\"segments\""));

	let restored: PositionMap = serde_json::from_str(&json)?;
	assert_eq!(restored, result.map);

	Ok(())
}

#[test]
fn error_offsets_point_into_the_source() {
	let error = preprocess("<d :each={list}></d>").unwrap_err();
	assert_eq!(error.offset(), Some(3));
}

#[rstest]
#[case(0, (1, 1))]
#[case(3, (2, 1))]
#[case(4, (2, 2))]
#[case(6, (3, 1))]
#[case(7, (4, 1))]
fn line_index_converts_offsets(
	#[case] offset: usize,
	#[case] expected: (usize, usize),
) {
	let index = LineIndex::new("ab\ncd\n\nx");
	assert_eq!(index.line_col(offset), expected);
}
