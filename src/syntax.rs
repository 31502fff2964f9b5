//! The finished syntax tree and its navigation layer.
//!
//! A [`SyntaxTree`] owns the root [`Tree`] a parse produced, together with
//! the language it was parsed with. [`Node`]s are lightweight handles that
//! derive parent links and absolute positions from the path they took from
//! the root, so the shared tree nodes themselves never carry back-pointers
//! and never form ownership cycles.

use std::fmt;

use triomphe::Arc;

use crate::{
    language::{Language, Symbol},
    length::Length,
    lexer::InputEdit,
    tree::{self, Tree},
};

/// A finished, frozen syntax tree.
pub struct SyntaxTree {
    root:     Tree,
    language: Arc<Language>,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree").field("root", &self.root).finish()
    }
}

impl SyntaxTree {
    pub(crate) fn new(root: Tree, language: Arc<Language>) -> Self {
        Self { root, language }
    }

    /// The root node.
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            path: Vec::new(),
        }
    }

    /// The underlying shared root. Mostly useful to hand a previous tree
    /// back to [`Parser::parse`](crate::parser::Parser::parse) or to check
    /// node identity across parses with [`Tree::ptr_eq`].
    pub fn root_tree(&self) -> &Tree {
        &self.root
    }

    /// The language the tree was parsed with.
    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    /// Characters covered by the whole tree, padding included.
    pub fn total_chars(&self) -> u32 {
        self.root.total_chars()
    }

    /// Applies an edit, returning a new tree that shares every untouched
    /// subtree with this one. Nodes the edit touched are marked changed so
    /// the next parse re-reads them.
    pub fn edit(&self, edit: &InputEdit) -> SyntaxTree {
        let interval = edit.interval();
        SyntaxTree {
            root:     tree::edited(&self.root, &interval, Length::ZERO),
            language: Arc::clone(&self.language),
        }
    }

    /// The s-expression rendering of the visible tree.
    pub fn sexp(&self) -> String {
        self.root().sexp()
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sexp())
    }
}

/// A node handle: the tree it belongs to plus the child-index path from the
/// root. Navigation rebuilds positions on the fly, so handles stay valid
/// and cheap while the tree itself remains free of parent pointers.
#[derive(Clone)]
pub struct Node<'tree> {
    tree: &'tree SyntaxTree,
    path: Vec<usize>,
}

impl<'tree> Node<'tree> {
    fn resolve(&self) -> (&'tree Tree, Length) {
        let mut current = &self.tree.root;
        let mut start = Length::ZERO;
        for &index in &self.path {
            for earlier in current.children().take(index) {
                start += earlier.total_size();
            }
            current = current.child(index).expect("node paths are always valid");
        }
        (current, start)
    }

    /// The shared tree node this handle points at.
    pub fn tree(&self) -> &'tree Tree {
        self.resolve().0
    }

    /// The node's symbol.
    pub fn symbol(&self) -> Symbol {
        self.tree().symbol()
    }

    /// The node's display name.
    pub fn name(&self) -> &'tree str {
        let symbol = self.symbol();
        self.tree.language.name(symbol).for_display()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.tree().child_count()
    }

    /// The `i`-th child.
    pub fn child(&self, i: usize) -> Option<Node<'tree>> {
        if i < self.tree().child_count() {
            let mut path = self.path.clone();
            path.push(i);
            Some(Node { tree: self.tree, path })
        } else {
            None
        }
    }

    /// Iterates over the children.
    pub fn children(&self) -> impl Iterator<Item = Node<'tree>> + '_ {
        (0..self.child_count()).map(move |i| self.child(i).expect("index is in bounds"))
    }

    /// The parent node; `None` for the root.
    pub fn parent(&self) -> Option<Node<'tree>> {
        if self.path.is_empty() {
            None
        } else {
            let mut path = self.path.clone();
            path.pop();
            Some(Node { tree: self.tree, path })
        }
    }

    /// This node's index in its parent; `None` for the root.
    pub fn index_in_parent(&self) -> Option<usize> {
        self.path.last().copied()
    }

    /// Where the node's content starts (its padding is not part of it).
    pub fn start_position(&self) -> Length {
        let (tree, start) = self.resolve();
        start + tree.padding()
    }

    /// Where the node ends.
    pub fn end_position(&self) -> Length {
        let (tree, start) = self.resolve();
        start + tree.total_size()
    }

    /// Whether an edit touched this subtree since it was parsed.
    pub fn has_changes(&self) -> bool {
        self.tree().has_changes()
    }

    /// `true` for error nodes and lexer-error leaves.
    pub fn is_error(&self) -> bool {
        self.tree().is_error()
    }

    /// Whether the node is an extra.
    pub fn is_extra(&self) -> bool {
        self.tree().is_extra()
    }

    /// Whether the node's symbol is named.
    pub fn is_named(&self) -> bool {
        self.tree().is_named()
    }

    /// The s-expression rendering of the visible tree below this node.
    ///
    /// Named visible nodes render as `(name child…)`, anonymous visible
    /// nodes quote their name, and invisible nodes splice their children
    /// into the parent -- so the rendering matches what the grammar's author
    /// thinks of as the tree's shape.
    pub fn sexp(&self) -> String {
        let mut out = String::new();
        append_sexp(self.tree(), &self.tree.language, &mut out);
        out
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.name(),
            self.start_position().chars,
            self.end_position().chars
        )
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sexp())
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.path == other.path
    }
}

impl Eq for Node<'_> {}

fn has_visible(tree: &Tree) -> bool {
    tree.is_visible() || tree.children().any(has_visible)
}

fn append_sexp(tree: &Tree, language: &Language, out: &mut String) {
    if tree.is_visible() {
        out.push('(');
        let name = language.name(tree.symbol()).for_display();
        if tree.is_named() {
            out.push_str(name);
        } else {
            out.push('"');
            out.push_str(name);
            out.push('"');
        }
        for child in tree.children() {
            if has_visible(child) {
                out.push(' ');
                append_sexp(child, language, out);
            }
        }
        out.push(')');
    } else {
        let mut first = true;
        for child in tree.children() {
            if has_visible(child) {
                if !first {
                    out.push(' ');
                }
                append_sexp(child, language, out);
                first = false;
            }
        }
    }
}
