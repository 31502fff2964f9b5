//! Shared harness for the integration tests.
//!
//! Each test grammar is a hand-built [`Language`]: the parse tables a
//! grammar compiler would emit, written out state by state, plus a literal
//! lexer driving the real [`Lexer`] machinery one character at a time.

mod ambiguity;
mod basic;
mod errors;
mod extras;

use larix::{
    Language, LanguageBuilder, LexStateId, Lexer, Node, ParseAction, Parser, StateId, StringInput,
    Symbol, SymbolMetadata, SyntaxTree, Tree,
};

/// Metadata of an anonymous (quoted) token such as `";"`.
pub const ANONYMOUS: SymbolMetadata = SymbolMetadata {
    visible:    true,
    named:      false,
    structural: true,
};

/// Metadata of whitespace extras.
pub const WS: SymbolMetadata = SymbolMetadata {
    visible:    false,
    named:      false,
    structural: false,
};

#[derive(Clone, Copy)]
pub enum Whitespace {
    /// Whitespace is not expected in the input.
    Forbidden,
    /// Whitespace runs are lexed as a token of the given symbol.
    Extra(Symbol),
}

/// A lex function over single-character tokens.
///
/// Always makes progress: an unrecognized character becomes a one-character
/// lexer-error leaf, with or without `fail_on_error`, and end of input
/// becomes the `END` token.
pub fn literal_lexer(
    tokens: Vec<(char, Symbol, SymbolMetadata)>,
    whitespace: Whitespace,
) -> impl Fn(&mut Lexer, LexStateId, bool) -> Option<Tree> + Send + Sync + 'static {
    move |lexer: &mut Lexer, lex_state: LexStateId, _fail_on_error: bool| {
        lexer.start(lex_state);
        lexer.start_token();
        let Some(ch) = lexer.lookahead() else {
            return Some(lexer.accept_end());
        };
        if let Whitespace::Extra(symbol) = whitespace {
            if ch.is_whitespace() {
                while matches!(lexer.lookahead(), Some(c) if c.is_whitespace()) {
                    lexer.advance();
                }
                return Some(lexer.accept(symbol, WS, false));
            }
        }
        for &(text, symbol, metadata) in &tokens {
            if text == ch {
                lexer.advance();
                return Some(lexer.accept(symbol, metadata, false));
            }
        }
        lexer.advance();
        Some(lexer.accept_error())
    }
}

pub fn parser_for(language: Language) -> Parser {
    let mut parser = Parser::new();
    parser.set_language(language);
    parser
}

pub fn parse(language: Language, text: &str) -> SyntaxTree {
    parser_for(language)
        .parse(Box::new(StringInput::new(text)), None)
        .expect("language is configured")
}

/// `S → 'a' 'b'`.
pub fn two_token_language() -> Language {
    let mut builder = LanguageBuilder::new();
    let a = builder.symbol("a");
    let b = builder.symbol("b");
    let s = builder.symbol("S");

    builder.action(StateId(0), a, ParseAction::shift(StateId(2)));
    builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());
    builder.action(StateId(2), b, ParseAction::shift(StateId(3)));
    builder.action(StateId(3), Symbol::END, ParseAction::reduce(s, 2));

    builder.build(literal_lexer(
        vec![('a', a, SymbolMetadata::DEFAULT), ('b', b, SymbolMetadata::DEFAULT)],
        Whitespace::Forbidden,
    ))
}

/// `S → ε`.
pub fn epsilon_language() -> Language {
    let mut builder = LanguageBuilder::new();
    let s = builder.symbol("S");

    builder.action(StateId(0), Symbol::END, ParseAction::reduce(s, 0));
    builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());

    builder.build(literal_lexer(Vec::new(), Whitespace::Forbidden))
}

/// `E → E '+' E | E '*' E | 'n'` with the conflicts already resolved the
/// way declared precedences resolve them: both operators are
/// left-associative, `*` binds tighter than `+`.
pub fn expression_language() -> Language {
    let mut builder = LanguageBuilder::new();
    let n = builder.symbol("n");
    let plus = builder.symbol_with("+", ANONYMOUS);
    let star = builder.symbol_with("*", ANONYMOUS);
    let e = builder.symbol("E");

    builder.action(StateId(0), n, ParseAction::shift(StateId(2)));
    builder.action(StateId(0), e, ParseAction::shift(StateId(1)));

    builder.action(StateId(1), plus, ParseAction::shift(StateId(3)));
    builder.action(StateId(1), star, ParseAction::shift(StateId(4)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());

    builder.action(StateId(2), plus, ParseAction::reduce(e, 1));
    builder.action(StateId(2), star, ParseAction::reduce(e, 1));
    builder.action(StateId(2), Symbol::END, ParseAction::reduce(e, 1));

    builder.action(StateId(3), n, ParseAction::shift(StateId(2)));
    builder.action(StateId(3), e, ParseAction::shift(StateId(5)));

    builder.action(StateId(4), n, ParseAction::shift(StateId(2)));
    builder.action(StateId(4), e, ParseAction::shift(StateId(6)));

    // E '+' E • -- reduce on '+' (left associative), shift '*' (tighter).
    builder.action(StateId(5), plus, ParseAction::reduce(e, 3));
    builder.action(StateId(5), star, ParseAction::shift(StateId(4)));
    builder.action(StateId(5), Symbol::END, ParseAction::reduce(e, 3));

    // E '*' E • -- reduce everywhere (left associative, highest).
    builder.action(StateId(6), plus, ParseAction::reduce(e, 3));
    builder.action(StateId(6), star, ParseAction::reduce(e, 3));
    builder.action(StateId(6), Symbol::END, ParseAction::reduce(e, 3));

    builder.build(literal_lexer(
        vec![
            ('n', n, SymbolMetadata::DEFAULT),
            ('+', plus, ANONYMOUS),
            ('*', star, ANONYMOUS),
        ],
        Whitespace::Forbidden,
    ))
}

/// `S → A 'b' | B 'b'; A → 'a'; B → 'a'` -- a genuine conflict whose two
/// reductions go to the *same* state, so the split heads merge immediately
/// and the tree selector picks the surviving interpretation.
///
/// `b_precedence` is the dynamic precedence of the `B → 'a'` reduction.
pub fn merging_language(b_precedence: i32) -> Language {
    let mut builder = LanguageBuilder::new();
    let a = builder.symbol("a");
    let b = builder.symbol("b");
    let sym_a = builder.symbol("A");
    let sym_b = builder.symbol("B");
    let s = builder.symbol("S");

    builder.action(StateId(0), a, ParseAction::shift(StateId(2)));
    builder.action(StateId(0), sym_a, ParseAction::shift(StateId(5)));
    builder.action(StateId(0), sym_b, ParseAction::shift(StateId(5)));
    builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());
    builder.action(StateId(2), b, ParseAction::reduce(sym_a, 1));
    builder.action(
        StateId(2),
        b,
        ParseAction::reduce(sym_b, 1).with_dynamic_precedence(b_precedence),
    );
    builder.action(StateId(5), b, ParseAction::shift(StateId(6)));
    builder.action(StateId(6), Symbol::END, ParseAction::reduce(s, 2));

    builder.build(literal_lexer(
        vec![('a', a, SymbolMetadata::DEFAULT), ('b', b, SymbolMetadata::DEFAULT)],
        Whitespace::Forbidden,
    ))
}

/// `S → X 'c' | Y 'c'; X → 'a'; Y → 'a'` -- the conflicting reductions go
/// to *different* states, which converge only when both shift `'c'` into
/// the same state. The stack below that entry is a real DAG and reducing
/// `S` pops two distinct histories.
pub fn converging_language() -> Language {
    let mut builder = LanguageBuilder::new();
    let a = builder.symbol("a");
    let c = builder.symbol("c");
    let x = builder.symbol("X");
    let y = builder.symbol("Y");
    let s = builder.symbol("S");

    builder.action(StateId(0), a, ParseAction::shift(StateId(2)));
    builder.action(StateId(0), x, ParseAction::shift(StateId(3)));
    builder.action(StateId(0), y, ParseAction::shift(StateId(4)));
    builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());
    builder.action(StateId(2), c, ParseAction::reduce(x, 1));
    builder.action(StateId(2), c, ParseAction::reduce(y, 1));
    builder.action(StateId(3), c, ParseAction::shift(StateId(5)));
    builder.action(StateId(4), c, ParseAction::shift(StateId(5)));
    builder.action(StateId(5), Symbol::END, ParseAction::reduce(s, 2));

    builder.build(literal_lexer(
        vec![('a', a, SymbolMetadata::DEFAULT), ('c', c, SymbolMetadata::DEFAULT)],
        Whitespace::Forbidden,
    ))
}

/// `S → 'a' 'b'` with whitespace declared as an extra token.
pub fn extras_language() -> Language {
    let mut builder = LanguageBuilder::new();
    let a = builder.symbol("a");
    let b = builder.symbol("b");
    let ws = builder.symbol_with("ws", WS);
    let s = builder.symbol("S");

    builder.action(StateId(0), a, ParseAction::shift(StateId(2)));
    builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
    builder.action(StateId(0), ws, ParseAction::shift_extra(StateId(0)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());
    builder.action(StateId(1), ws, ParseAction::shift_extra(StateId(1)));
    builder.action(StateId(2), b, ParseAction::shift(StateId(3)));
    builder.action(StateId(2), ws, ParseAction::shift_extra(StateId(2)));
    builder.action(StateId(3), Symbol::END, ParseAction::reduce(s, 2));
    builder.action(StateId(3), ws, ParseAction::shift_extra(StateId(3)));

    builder.build(literal_lexer(
        vec![('a', a, SymbolMetadata::DEFAULT), ('b', b, SymbolMetadata::DEFAULT)],
        Whitespace::Extra(ws),
    ))
}

/// A statement list `S → S P | P; P → 'a' ';'` whose tables include error
/// recovery: state 0 can shift an `ERROR`, and the recovery states consume
/// junk up to a `';'`, closing the damaged region off as a `P`.
pub fn recovering_language() -> Language {
    let mut builder = LanguageBuilder::new();
    let a = builder.symbol("a");
    let semi = builder.symbol_with(";", ANONYMOUS);
    let p = builder.symbol("P");
    let s = builder.symbol("S");

    builder.action(StateId(0), a, ParseAction::shift(StateId(3)));
    builder.action(StateId(0), p, ParseAction::shift(StateId(2)));
    builder.action(StateId(0), s, ParseAction::shift(StateId(1)));
    builder.action(StateId(0), Symbol::ERROR, ParseAction::shift(StateId(7)));

    builder.action(StateId(1), a, ParseAction::shift(StateId(3)));
    builder.action(StateId(1), p, ParseAction::shift(StateId(5)));
    builder.action(StateId(1), Symbol::END, ParseAction::accept());

    builder.action(StateId(2), a, ParseAction::reduce(s, 1));
    builder.action(StateId(2), Symbol::END, ParseAction::reduce(s, 1));

    builder.action(StateId(3), semi, ParseAction::shift(StateId(4)));

    builder.action(StateId(4), a, ParseAction::reduce(p, 2));
    builder.action(StateId(4), Symbol::END, ParseAction::reduce(p, 2));

    builder.action(StateId(5), a, ParseAction::reduce(s, 2));
    builder.action(StateId(5), Symbol::END, ParseAction::reduce(s, 2));

    // Recovery: an ERROR node, then junk tokens, then ';' closes it as a P.
    builder.action(StateId(7), Symbol::LEXER_ERROR, ParseAction::shift(StateId(7)));
    builder.action(StateId(7), semi, ParseAction::shift(StateId(8)));
    builder.action(StateId(8), a, ParseAction::reduce(p, 3));
    builder.action(StateId(8), Symbol::END, ParseAction::reduce(p, 3));

    builder.build(literal_lexer(
        vec![('a', a, SymbolMetadata::DEFAULT), (';', semi, ANONYMOUS)],
        Whitespace::Forbidden,
    ))
}

/// Asserts that every node in `tree` satisfies the parent/child identity:
/// `node.parent().child(node.index_in_parent()) == node`.
pub fn assert_parent_consistency(tree: &SyntaxTree) {
    fn check(node: &Node<'_>) {
        if let (Some(parent), Some(index)) = (node.parent(), node.index_in_parent()) {
            let back = parent.child(index).expect("index is valid in the parent");
            assert_eq!(&back, node);
        }
        for child in node.children() {
            check(&child);
        }
    }
    check(&tree.root());
}
