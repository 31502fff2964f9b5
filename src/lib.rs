//! `larix` is an incremental parsing runtime: given a context-free grammar
//! compiled into parse tables and an input text -- optionally with a
//! previously produced syntax tree and a description of what changed -- it
//! produces a lossless concrete syntax tree.
//!
//! The runtime is a *generalized* LR (GLR) parser. Where a plain LR parser
//! would reject an ambiguous table outright, this one explores every
//! possibility at once: the parse stack is a graph in which diverging
//! parses share their common prefix, heads that converge on the same state
//! are merged, and competing subtrees for the same span are ranked by a
//! deterministic comparator. The final tree for a given (grammar, input,
//! previous tree) is bit-identical across runs.
//!
//! Three properties shape the design:
//!
//! - **Trees are shared, not copied.** Every node is an atomically
//!   reference-counted [`Tree`] recording only its padding and size, never
//!   an absolute position. An unchanged subtree of the previous parse can
//!   therefore be stitched into the new tree unchanged, no matter how far
//!   an edit shifted it. Mutation during parsing is copy-on-write.
//! - **Errors never fail a parse.** Unrecognizable input turns into
//!   `ERROR` nodes embedded in the tree -- by unwinding the stack to a
//!   state that expects an error, or by skipping tokens -- and the parse
//!   carries on.
//! - **The grammar is data.** A [`Language`] is a table of actions, a
//!   lex-state table, symbol metadata and a lex function; this crate
//!   executes tables but never builds them from a grammar. (Tests build
//!   them by hand through [`LanguageBuilder`].)
//!
//! ## Parsing
//!
//! Configure a [`Parser`] with a [`Language`] and feed it an [`Input`]:
//!
//! ```rust,ignore
//! let mut parser = Parser::new();
//! parser.set_language(language);
//! let tree = parser
//!     .parse(Box::new(StringInput::new("a b")), None)
//!     .expect("language is configured");
//! assert_eq!(tree.sexp(), "(S (a) (b))");
//! ```
//!
//! ## Reparsing after an edit
//!
//! Describe the change with an [`InputEdit`], apply it to the old tree with
//! [`SyntaxTree::edit`], and hand that tree to the next parse. Subtrees the
//! edit did not touch are reused by reference:
//!
//! ```rust,ignore
//! let edited = tree.edit(&InputEdit::insertion(3, 1));
//! let new_tree = parser
//!     .parse(Box::new(StringInput::new("a bc")), Some(&edited))
//!     .unwrap();
//! ```
//!
//! The navigation layer ([`SyntaxTree::root`], [`Node`]) derives parent
//! links and absolute positions from the path a handle took from the root,
//! so the shared nodes themselves stay free of back-references.

#![warn(missing_docs)]
#![warn(rustdoc::private_intra_doc_links)]

pub mod language;
pub mod length;
pub mod lexer;
pub mod parser;
mod stack;
pub mod syntax;
pub mod tree;

pub use language::{
    ActionKind, Language, LanguageBuilder, LexStateId, ParseAction, StateId, Symbol, SymbolMetadata,
    SymbolName,
};
pub use length::{Length, Point};
pub use lexer::{Encoding, Input, InputEdit, Lexer, StringInput};
pub use parser::{DebugEvent, Debugger, Parser};
pub use syntax::{Node, SyntaxTree};
pub use tree::{compare, Tree};
