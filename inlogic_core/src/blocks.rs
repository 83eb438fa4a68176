use std::collections::HashMap;

use crate::Span;
use crate::keywords::Keyword;
use crate::parser::NodeId;

/// The scope a keyword belongs to: its element's parent id, or `None` for
/// the document-root sentinel.
pub type ScopeKey = Option<NodeId>;

/// One block part: the element a marker was found on and the decoded
/// keyword. The element's span is carried so the emitter can anchor markers
/// without re-walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
	pub node: NodeId,
	pub span: Span,
	pub keyword: Keyword,
}

/// The accumulated parts of one control-flow construct, built up across
/// sibling elements until a conflicting keyword, an end-of-sibling-list
/// flush, or (for `catch`) the keyword itself finalizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
	If(IfBlock),
	Each(EachBlock),
	Await(AwaitBlock),
	Key(KeyBlock),
}

/// `:if` / `:else-if` / `:else` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBlock {
	pub r#if: Part,
	pub else_ifs: Vec<Part>,
	pub r#else: Option<Part>,
}

impl IfBlock {
	pub fn new(r#if: Part) -> Self {
		Self {
			r#if,
			else_ifs: Vec::new(),
			r#else: None,
		}
	}
}

/// `:each` with its mandatory `:as` binding, optional `:key`, and optional
/// `:else` fallback. The `:as` and `:key` markers must sit on the `:each`
/// element itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EachBlock {
	pub each: Part,
	pub r#as: Option<Part>,
	pub key: Option<Part>,
	pub r#else: Option<Part>,
}

impl EachBlock {
	pub fn new(each: Part) -> Self {
		Self {
			each,
			r#as: None,
			key: None,
			r#else: None,
		}
	}
}

/// `:await` with optional `:then` / `:catch` continuations. Continuations on
/// the `:await` element itself collapse into the shorthand opening marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitBlock {
	pub r#await: Part,
	pub then: Option<Part>,
	pub catch: Option<Part>,
}

impl AwaitBlock {
	pub fn new(r#await: Part) -> Self {
		Self {
			r#await,
			then: None,
			catch: None,
		}
	}
}

/// A standalone `:key` marker (one not attached to an `:each`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBlock {
	pub key: Part,
}

/// One scope's mutable state: at most one open block at any time.
#[derive(Debug, Default)]
pub struct Scope {
	pub open: Option<Block>,
}

/// Maps each scope key to its [`Scope`], lazily creating empty scopes on
/// first access. Entries are never removed mid-traversal, and creation
/// order is retained so the end-of-traversal sweep is deterministic.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
	scopes: HashMap<ScopeKey, Scope>,
	order: Vec<ScopeKey>,
}

impl ScopeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Look up (or create) the scope for a key.
	pub fn scope_mut(&mut self, key: ScopeKey) -> &mut Scope {
		let order = &mut self.order;
		self.scopes.entry(key).or_insert_with(|| {
			order.push(key);
			Scope::default()
		})
	}

	/// All scope keys in creation order.
	pub fn keys_in_order(&self) -> Vec<ScopeKey> {
		self.order.clone()
	}

	/// True when no scope holds an open block.
	pub fn all_closed(&self) -> bool {
		self.scopes.values().all(|scope| scope.open.is_none())
	}
}
