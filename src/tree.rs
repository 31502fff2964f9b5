//! The shared concrete syntax tree.
//!
//! Trees are immutable once they reach the caller, cheap to share (a
//! [`Tree`] is one atomically reference-counted pointer) and position
//! independent: a node records the `padding` before its content and the
//! `size` of the content, never an absolute offset, so an unchanged subtree
//! can be reused at a shifted position without rewriting it.
//!
//! During a parse the driver stages per-head mutations (the `extra` flag,
//! fragility, the parse state a node was built in) through copy-on-write:
//! [`Tree::make_mut`] clones the node exactly when it is shared, so a
//! subtree that another stack head -- or a previous syntax tree -- still
//! references is never edited in place.

use std::{cmp::Ordering, fmt};

use triomphe::Arc;

use crate::{
    language::{LexStateId, StateId, Symbol, SymbolMetadata},
    length::Length,
};

/// The payload of one tree node.
///
/// `error_count`, `node_count` and `dynamic_precedence` are aggregates over
/// the whole subtree, maintained by the constructors and by
/// [`Tree::set_children`] so the tree selector never has to traverse.
#[derive(Debug, Clone)]
pub(crate) struct TreeData {
    pub(crate) symbol:         Symbol,
    pub(crate) padding:        Length,
    pub(crate) size:           Length,
    pub(crate) children:       Vec<Tree>,
    pub(crate) parse_state:    Option<StateId>,
    pub(crate) lex_state:      Option<LexStateId>,
    pub(crate) extra:          bool,
    pub(crate) fragile_left:   bool,
    pub(crate) fragile_right:  bool,
    pub(crate) has_changes:    bool,
    pub(crate) visible:        bool,
    pub(crate) named:          bool,
    /// For lexer-error leaves: the character that could not be lexed.
    pub(crate) lookahead_char: Option<char>,

    pub(crate) error_count:        u32,
    pub(crate) node_count:         u32,
    /// Summed dynamic precedence of every production in the subtree.
    pub(crate) dynamic_precedence: i32,
    /// This production's own contribution to `dynamic_precedence`.
    pub(crate) production_precedence: i32,
}

/// A node of the concrete syntax tree.
///
/// Cloning is cheap and shares the node. See the [module docs](self) for
/// the mutation discipline.
#[derive(Clone)]
pub struct Tree {
    data: Arc<TreeData>,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("symbol", &self.symbol())
            .field("padding", &self.padding())
            .field("size", &self.size())
            .field("children", &self.data.children)
            .finish()
    }
}

impl Tree {
    /// Creates a leaf for a lexed token.
    pub fn leaf(symbol: Symbol, padding: Length, size: Length, metadata: SymbolMetadata) -> Tree {
        Tree {
            data: Arc::new(TreeData {
                symbol,
                padding,
                size,
                children: Vec::new(),
                parse_state: None,
                lex_state: None,
                extra: false,
                fragile_left: false,
                fragile_right: false,
                has_changes: false,
                visible: metadata.visible,
                named: metadata.named,
                lookahead_char: None,
                error_count: 0,
                node_count: 1,
                dynamic_precedence: 0,
                production_precedence: 0,
            }),
        }
    }

    /// Creates a leaf for input the lexer could not recognize.
    ///
    /// The leaf carries [`Symbol::LEXER_ERROR`] and remembers the character
    /// the lexer stopped on.
    pub fn error_leaf(size: Length, padding: Length, lookahead_char: Option<char>) -> Tree {
        Tree {
            data: Arc::new(TreeData {
                symbol: Symbol::LEXER_ERROR,
                padding,
                size,
                children: Vec::new(),
                parse_state: None,
                lex_state: None,
                extra: false,
                fragile_left: true,
                fragile_right: true,
                has_changes: false,
                visible: true,
                named: true,
                lookahead_char,
                error_count: 1,
                node_count: 1,
                dynamic_precedence: 0,
                production_precedence: 0,
            }),
        }
    }

    /// Creates an internal node over `children`.
    ///
    /// `dynamic_precedence` is the production's own contribution; the
    /// children's sums are folded in.
    pub fn node(
        symbol: Symbol,
        children: Vec<Tree>,
        metadata: SymbolMetadata,
        dynamic_precedence: i32,
    ) -> Tree {
        let mut tree = Tree {
            data: Arc::new(TreeData {
                symbol,
                padding: Length::ZERO,
                size: Length::ZERO,
                children: Vec::new(),
                parse_state: None,
                lex_state: None,
                extra: false,
                fragile_left: false,
                fragile_right: false,
                has_changes: false,
                visible: metadata.visible,
                named: metadata.named,
                lookahead_char: None,
                error_count: 0,
                node_count: 1,
                dynamic_precedence,
                production_precedence: dynamic_precedence,
            }),
        };
        tree.set_children(children);
        tree
    }

    /// Shallow-clones the node so per-head flags can be set without
    /// touching the shared original.
    pub fn make_copy(&self) -> Tree {
        Tree {
            data: Arc::new((*self.data).clone()),
        }
    }

    /// Copy-on-write access to the node's payload.
    pub(crate) fn make_mut(&mut self) -> &mut TreeData {
        if !Arc::is_unique(&self.data) {
            self.data = Arc::new((*self.data).clone());
        }
        Arc::get_mut(&mut self.data).expect("tree was just made unique")
    }

    /// Replaces the node's children, recomputing sizes, aggregates and
    /// boundary fragility.
    pub fn set_children(&mut self, children: Vec<Tree>) {
        let production_precedence = self.data.production_precedence;
        let symbol = self.data.symbol;
        let data = self.make_mut();

        let mut size = Length::ZERO;
        let mut node_count = 1;
        let mut error_count = u32::from(symbol == Symbol::ERROR);
        let mut dynamic_precedence = production_precedence;
        let mut has_changes = false;
        for child in &children {
            size += child.total_size();
            node_count += child.node_count();
            error_count += child.error_count();
            dynamic_precedence += child.dynamic_precedence();
            has_changes |= child.has_changes();
        }

        data.padding = children.first().map(|first| first.padding()).unwrap_or(Length::ZERO);
        data.size = size - data.padding;
        data.node_count = node_count;
        data.error_count = error_count;
        data.dynamic_precedence = dynamic_precedence;
        data.has_changes |= has_changes;
        if let Some(first) = children.first() {
            data.fragile_left |= first.is_fragile();
        }
        if let Some(last) = children.last() {
            data.fragile_right |= last.is_fragile();
        }
        data.children = children;
    }

    /// The node's symbol.
    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.data.symbol
    }

    /// The padding before the node's content.
    #[inline]
    pub fn padding(&self) -> Length {
        self.data.padding
    }

    /// The length of the node's content.
    #[inline]
    pub fn size(&self) -> Length {
        self.data.size
    }

    /// Padding and content together.
    #[inline]
    pub fn total_size(&self) -> Length {
        self.data.padding + self.data.size
    }

    /// Characters covered, padding included.
    #[inline]
    pub fn total_chars(&self) -> u32 {
        self.total_size().chars
    }

    /// Bytes covered, padding included.
    #[inline]
    pub fn total_bytes(&self) -> text_size::TextSize {
        self.total_size().bytes
    }

    /// Number of children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.data.children.len()
    }

    /// The `i`-th child, if any.
    #[inline]
    pub fn child(&self, i: usize) -> Option<&Tree> {
        self.data.children.get(i)
    }

    /// Iterates over the children.
    #[inline]
    pub fn children(&self) -> std::slice::Iter<'_, Tree> {
        self.data.children.iter()
    }

    /// `true` for error nodes and lexer-error leaves.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.data.symbol.is_error()
    }

    /// Whether the node is an extra (whitespace, comment) rather than part
    /// of a production.
    #[inline]
    pub fn is_extra(&self) -> bool {
        self.data.extra
    }

    /// Whether the node's validity depends on its parse context.
    #[inline]
    pub fn is_fragile(&self) -> bool {
        self.data.fragile_left || self.data.fragile_right
    }

    /// Whether an edit touched this subtree since it was built.
    #[inline]
    pub fn has_changes(&self) -> bool {
        self.data.has_changes
    }

    /// Whether the node appears in the rendered tree.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.data.visible
    }

    /// Whether the node's symbol is named.
    #[inline]
    pub fn is_named(&self) -> bool {
        self.data.named
    }

    /// The parse state the node was built in, if still valid.
    #[inline]
    pub fn parse_state(&self) -> Option<StateId> {
        self.data.parse_state
    }

    /// The lexer start state the node's first token depended on, or `None`
    /// when lexing was state independent.
    #[inline]
    pub fn lex_state(&self) -> Option<LexStateId> {
        self.data.lex_state
    }

    /// Total error nodes in the subtree.
    #[inline]
    pub fn error_count(&self) -> u32 {
        self.data.error_count
    }

    /// Total nodes in the subtree.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.data.node_count
    }

    /// Summed dynamic precedence of the subtree's productions.
    #[inline]
    pub fn dynamic_precedence(&self) -> i32 {
        self.data.dynamic_precedence
    }

    /// For lexer-error leaves, the character that could not be lexed.
    #[inline]
    pub fn lookahead_char(&self) -> Option<char> {
        self.data.lookahead_char
    }

    /// Whether two handles point at the same node.
    #[inline]
    pub fn ptr_eq(a: &Tree, b: &Tree) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }
}

/// Totally orders competing trees for the same input span.
///
/// `Less` means `a` is the better parse. The ordering prefers, in priority
/// order: fewer error nodes, higher summed dynamic precedence, fewer nodes,
/// and finally the lexicographically smaller symbol structure. `Equal`
/// means the caller should keep whichever tree it already has.
pub fn compare(a: &Tree, b: &Tree) -> Ordering {
    a.error_count()
        .cmp(&b.error_count())
        .then_with(|| b.dynamic_precedence().cmp(&a.dynamic_precedence()))
        .then_with(|| a.node_count().cmp(&b.node_count()))
        .then_with(|| compare_structure(a, b))
}

fn compare_structure(a: &Tree, b: &Tree) -> Ordering {
    let ordering = a
        .symbol()
        .cmp(&b.symbol())
        .then_with(|| a.child_count().cmp(&b.child_count()));
    if ordering != Ordering::Equal {
        return ordering;
    }
    for (left, right) in a.children().zip(b.children()) {
        let ordering = compare_structure(left, right);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// An edit interval in absolute document positions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EditInterval {
    pub(crate) start:   Length,
    pub(crate) old_end: Length,
    pub(crate) new_end: Length,
}

impl EditInterval {
    /// Maps an old document position to its new position.
    fn map(&self, position: Length) -> Length {
        if position.bytes <= self.start.bytes {
            position
        } else if position.bytes >= self.old_end.bytes {
            self.new_end + (position - self.old_end)
        } else {
            self.new_end
        }
    }

    /// Whether a node spanning `[node_start, node_end)` must be rebuilt.
    ///
    /// A pure insertion exactly at `node_end` does *not* touch the node:
    /// the inserted text belongs to whatever follows, and a wholesale reuse
    /// of the node is corrected by lookahead verification during the next
    /// parse.
    fn affects(&self, node_start: Length, node_end: Length) -> bool {
        self.start.bytes < node_end.bytes && self.old_end.bytes >= node_start.bytes
    }
}

/// Rewrites `tree` for an edit, sharing every untouched subtree.
///
/// Touched nodes get `has_changes` set; the touched leaves' padding and
/// size are remapped so that the positions of all *following* siblings stay
/// exact in the new document. Character and byte components are exact; the
/// row/column extent of a node that absorbed an edit is approximate until
/// the next parse re-lexes it.
pub(crate) fn edited(tree: &Tree, edit: &EditInterval, node_start: Length) -> Tree {
    let padding_end = node_start + tree.padding();
    let node_end = padding_end + tree.size();
    if !edit.affects(node_start, node_end) {
        return tree.clone();
    }

    if tree.child_count() == 0 {
        let mut result = tree.clone();
        let data = result.make_mut();
        data.padding = edit.map(padding_end) - edit.map(node_start);
        data.size = edit.map(node_end) - edit.map(padding_end);
        data.has_changes = true;
        return result;
    }

    let mut children = Vec::with_capacity(tree.child_count());
    let mut child_start = node_start;
    for child in tree.children() {
        let child_total = child.total_size();
        children.push(edited(child, edit, child_start));
        child_start += child_total;
    }

    let mut result = tree.clone();
    result.set_children(children);
    result.make_mut().has_changes = true;
    result
}
