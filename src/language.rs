//! Grammar tables consumed by the parser.
//!
//! A [`Language`] is the run-time image of a compiled grammar: a parse-action
//! table indexed by `(state, symbol)`, a lex-state table mapping each parse
//! state to the lexer start state that is valid there, per-symbol metadata
//! and names, and the lex function that turns input characters into leaf
//! trees. This crate does not compile grammars; tables are produced
//! externally (by a generator, or by hand through [`LanguageBuilder`] in
//! tests) and only *read* here.

use rustc_hash::FxHashMap;

use crate::{lexer::Lexer, tree::Tree};

/// A grammar symbol: a small index into the language's symbol tables.
///
/// Three symbols are reserved in every language: [`Symbol::END`] marks the
/// end of input, [`Symbol::ERROR`] names the nodes produced by error
/// recovery, and [`Symbol::LEXER_ERROR`] marks leaves the lexer emits for
/// unrecognizable characters. Keeping the lexer sentinel separate from
/// `ERROR` means a lexer failure reaches the driver as an ordinary symbol
/// with no actions, rather than as a special case in the parse loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u16);

impl Symbol {
    /// The end-of-input symbol.
    pub const END: Symbol = Symbol(0);
    /// The symbol of nodes produced by error recovery.
    pub const ERROR: Symbol = Symbol(1);
    /// The symbol of leaves produced by the lexer for unrecognized input.
    pub const LEXER_ERROR: Symbol = Symbol(2);

    /// `true` for [`Symbol::ERROR`] and [`Symbol::LEXER_ERROR`].
    #[inline]
    pub fn is_error(self) -> bool {
        self == Symbol::ERROR || self == Symbol::LEXER_ERROR
    }
}

/// A parse state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u16);

impl StateId {
    /// The start state every parse begins in.
    pub const START: StateId = StateId(0);
}

/// A start state of the lex DFA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LexStateId(pub u16);

/// Per-symbol facts the parser consults when building trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMetadata {
    /// Whether nodes with this symbol appear in the rendered tree.
    pub visible:    bool,
    /// Whether the symbol has a name of its own (as opposed to being an
    /// anonymous literal).
    pub named:      bool,
    /// Whether the symbol takes part in the grammar's structure. Extras
    /// such as whitespace and comments are non-structural.
    pub structural: bool,
}

impl SymbolMetadata {
    /// Metadata of an ordinary visible, named, structural symbol.
    pub const DEFAULT: SymbolMetadata = SymbolMetadata {
        visible:    true,
        named:      true,
        structural: true,
    };
}

/// The internal/external name pair of a symbol.
///
/// The internal name is the identifier used inside the grammar; the external
/// name is what hosts display. Rendering prefers the internal name when one
/// exists.
#[derive(Debug, Clone)]
pub struct SymbolName {
    /// Grammar-internal identifier, if it differs from the external name.
    pub internal: Option<String>,
    /// Display name.
    pub external: String,
}

impl SymbolName {
    /// The name used when rendering nodes.
    #[inline]
    pub fn for_display(&self) -> &str {
        self.internal.as_deref().unwrap_or(&self.external)
    }
}

/// What a parse action does once its flags have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Push the lookahead and move to `state`.
    Shift {
        /// The state to move to.
        state: StateId,
    },
    /// Pop `child_count` structural entries and push a `symbol` node.
    Reduce {
        /// The symbol of the node to build.
        symbol:             Symbol,
        /// How many structural stack entries the production covers.
        child_count:        u32,
        /// Contribution to the tree selector's precedence sum.
        dynamic_precedence: i32,
    },
    /// The start symbol is complete; finish this head.
    Accept,
}

/// One entry of the parse-action table.
///
/// A `(state, symbol)` pair maps to an ordered list of actions; when the
/// grammar is ambiguous there is more than one and the driver splits the
/// stack for each. A `Shift`, if present, is always last in the list. The
/// *absence* of any action is the error case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAction {
    /// What the action does.
    pub kind:           ActionKind,
    /// Marks shifts of extra tokens and reductions of extra rules.
    pub extra:          bool,
    /// Marks reductions whose result depends on the parse context and must
    /// be re-verified before reuse.
    pub fragile:        bool,
    /// Set when the compiled table may rewrite the subtree's structure
    /// differently at this state, which forbids reusing it here.
    pub can_hide_split: bool,
}

impl ParseAction {
    /// A plain shift to `state`.
    #[inline]
    pub const fn shift(state: StateId) -> Self {
        ParseAction {
            kind:           ActionKind::Shift { state },
            extra:          false,
            fragile:        false,
            can_hide_split: false,
        }
    }

    /// A shift of an extra token; the parse state does not change.
    #[inline]
    pub const fn shift_extra(state: StateId) -> Self {
        ParseAction {
            kind:           ActionKind::Shift { state },
            extra:          true,
            fragile:        false,
            can_hide_split: false,
        }
    }

    /// A reduction of `child_count` entries to `symbol`.
    #[inline]
    pub const fn reduce(symbol: Symbol, child_count: u32) -> Self {
        ParseAction {
            kind:           ActionKind::Reduce {
                symbol,
                child_count,
                dynamic_precedence: 0,
            },
            extra:          false,
            fragile:        false,
            can_hide_split: false,
        }
    }

    /// A reduction of a single extra tree to `symbol`.
    #[inline]
    pub const fn reduce_extra(symbol: Symbol) -> Self {
        let mut action = Self::reduce(symbol, 1);
        action.extra = true;
        action
    }

    /// The accept action.
    #[inline]
    pub const fn accept() -> Self {
        ParseAction {
            kind:           ActionKind::Accept,
            extra:          false,
            fragile:        false,
            can_hide_split: false,
        }
    }

    /// Marks the action fragile.
    #[inline]
    pub const fn with_fragile(mut self) -> Self {
        self.fragile = true;
        self
    }

    /// Marks the action as hiding a split.
    #[inline]
    pub const fn with_can_hide_split(mut self) -> Self {
        self.can_hide_split = true;
        self
    }

    /// Sets the dynamic precedence of a reduction.
    ///
    /// # Panics
    /// If the action is not a reduction.
    pub const fn with_dynamic_precedence(mut self, precedence: i32) -> Self {
        match self.kind {
            ActionKind::Reduce {
                symbol, child_count, ..
            } => {
                self.kind = ActionKind::Reduce {
                    symbol,
                    child_count,
                    dynamic_precedence: precedence,
                };
                self
            }
            _ => panic!("dynamic precedence only applies to reductions"),
        }
    }
}

/// The lex function of a language: `(lexer, lex_state, fail_on_error)`.
///
/// Must return `Some` leaf whenever input remains; with `fail_on_error` set
/// it must *always* make progress, emitting a one-character
/// [`Symbol::LEXER_ERROR`] leaf if nothing matches. Returns `None` only when
/// the language genuinely cannot produce a tree (which the driver treats as
/// a failed parse).
pub type LexFn = Box<dyn Fn(&mut Lexer, LexStateId, bool) -> Option<Tree> + Send + Sync>;

/// The run-time tables of a compiled grammar.
pub struct Language {
    pub(crate) states:     Vec<FxHashMap<Symbol, Vec<ParseAction>>>,
    pub(crate) lex_states: Vec<LexStateId>,
    pub(crate) metadata:   Vec<SymbolMetadata>,
    pub(crate) names:      Vec<SymbolName>,
    pub(crate) lex_fn:     LexFn,
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("state_count", &self.states.len())
            .field("symbol_count", &self.metadata.len())
            .finish_non_exhaustive()
    }
}

impl Language {
    /// The ordered actions for `(state, symbol)`; empty means error.
    #[inline]
    pub fn actions(&self, state: StateId, symbol: Symbol) -> &[ParseAction] {
        self.states
            .get(state.0 as usize)
            .and_then(|row| row.get(&symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The last action for `(state, symbol)` -- the canonical one when the
    /// entry is a conflict, since `Shift` sorts last.
    #[inline]
    pub fn last_action(&self, state: StateId, symbol: Symbol) -> Option<ParseAction> {
        self.actions(state, symbol).last().copied()
    }

    /// The lex DFA start state for a parse state.
    #[inline]
    pub fn lex_state(&self, state: StateId) -> LexStateId {
        self.lex_states.get(state.0 as usize).copied().unwrap_or_default()
    }

    /// The metadata of a symbol.
    #[inline]
    pub fn metadata(&self, symbol: Symbol) -> SymbolMetadata {
        self.metadata[symbol.0 as usize]
    }

    /// The name pair of a symbol.
    #[inline]
    pub fn name(&self, symbol: Symbol) -> &SymbolName {
        &self.names[symbol.0 as usize]
    }

    /// How many symbols the language defines, reserved ones included.
    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.metadata.len()
    }

    #[inline]
    pub(crate) fn lex(&self, lexer: &mut Lexer, lex_state: LexStateId, fail_on_error: bool) -> Option<Tree> {
        (self.lex_fn)(lexer, lex_state, fail_on_error)
    }
}

/// Hand construction surface for [`Language`] tables.
///
/// This is the interface a table generator (or a test) drives; the builder
/// only records what it is told and performs no grammar analysis.
///
/// ```rust,ignore
/// let mut builder = LanguageBuilder::new();
/// let a = builder.symbol("a");
/// let s = builder.symbol("S");
/// builder.action(StateId(0), a, ParseAction::shift(StateId(2)));
/// builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
/// builder.action(StateId(1), Symbol::END, ParseAction::accept());
/// let language = builder.build(my_lex_fn);
/// ```
pub struct LanguageBuilder {
    states:     Vec<FxHashMap<Symbol, Vec<ParseAction>>>,
    lex_states: indexmap::IndexMap<StateId, LexStateId>,
    metadata:   Vec<SymbolMetadata>,
    names:      Vec<SymbolName>,
}

impl Default for LanguageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageBuilder {
    /// Creates a builder with the reserved symbols already registered.
    pub fn new() -> Self {
        let invisible = SymbolMetadata {
            visible:    false,
            named:      false,
            structural: true,
        };
        let error = SymbolMetadata {
            visible:    true,
            named:      true,
            structural: true,
        };
        Self {
            states:     Vec::new(),
            lex_states: indexmap::IndexMap::new(),
            metadata:   vec![invisible, error, error],
            names:      vec![
                SymbolName {
                    internal: None,
                    external: "end".to_string(),
                },
                SymbolName {
                    internal: None,
                    external: "ERROR".to_string(),
                },
                SymbolName {
                    internal: None,
                    external: "ERROR".to_string(),
                },
            ],
        }
    }

    /// Registers a visible, named, structural symbol.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        self.symbol_with(name, SymbolMetadata::DEFAULT)
    }

    /// Registers a symbol with explicit metadata.
    pub fn symbol_with(&mut self, name: &str, metadata: SymbolMetadata) -> Symbol {
        let symbol = Symbol(self.metadata.len() as u16);
        self.metadata.push(metadata);
        self.names.push(SymbolName {
            internal: None,
            external: name.to_string(),
        });
        symbol
    }

    /// Appends one action to the `(state, symbol)` row.
    ///
    /// Actions are kept in insertion order; insert a conflicting row's
    /// `Shift` last, as a generator would.
    pub fn action(&mut self, state: StateId, symbol: Symbol, action: ParseAction) -> &mut Self {
        let index = state.0 as usize;
        if self.states.len() <= index {
            self.states.resize_with(index + 1, FxHashMap::default);
        }
        self.states[index].entry(symbol).or_default().push(action);
        self
    }

    /// Sets the lex DFA start state for a parse state. States without an
    /// entry use lex state 0.
    pub fn lex_state(&mut self, state: StateId, lex_state: LexStateId) -> &mut Self {
        self.lex_states.insert(state, lex_state);
        self
    }

    /// Finishes the tables with the given lex function.
    pub fn build(
        self,
        lex_fn: impl Fn(&mut Lexer, LexStateId, bool) -> Option<Tree> + Send + Sync + 'static,
    ) -> Language {
        let state_count = self.states.len().max(1);
        let mut lex_states = vec![LexStateId::default(); state_count];
        for (state, lex_state) in self.lex_states {
            let index = state.0 as usize;
            if lex_states.len() <= index {
                lex_states.resize(index + 1, LexStateId::default());
            }
            lex_states[index] = lex_state;
        }
        Language {
            states: self.states,
            lex_states,
            metadata: self.metadata,
            names: self.names,
            lex_fn: Box::new(lex_fn),
        }
    }
}
