use std::sync::{Arc, Mutex};

use larix::{DebugEvent, Debugger, Point, StringInput};

use super::*;

#[test]
fn parses_a_two_token_input() {
    let tree = parse(two_token_language(), "ab");
    assert_eq!(tree.sexp(), "(S (a) (b))");
    assert_eq!(tree.total_chars(), 2);
    assert_eq!(tree.root_tree().error_count(), 0);
}

#[test]
fn node_positions_and_names() {
    let tree = parse(two_token_language(), "ab");
    let root = tree.root();
    assert_eq!(root.name(), "S");
    assert_eq!(root.child_count(), 2);

    let a = root.child(0).unwrap();
    let b = root.child(1).unwrap();
    assert_eq!(a.name(), "a");
    assert_eq!(b.name(), "b");
    assert_eq!(a.start_position().chars, 0);
    assert_eq!(a.end_position().chars, 1);
    assert_eq!(b.start_position().chars, 1);
    assert_eq!(b.end_position().chars, 2);
    assert_eq!(b.end_position().extent, Point::new(0, 2));
}

#[test]
fn parents_are_consistent() {
    let tree = parse(two_token_language(), "ab");
    assert_parent_consistency(&tree);

    let root = tree.root();
    let a = root.child(0).unwrap();
    assert_eq!(a.parent().unwrap(), root);
    assert_eq!(a.index_in_parent(), Some(0));
    assert_eq!(root.parent(), None);
    assert_eq!(root.index_in_parent(), None);
}

#[test]
fn parses_the_empty_input_with_an_epsilon_grammar() {
    let tree = parse(epsilon_language(), "");
    assert_eq!(tree.sexp(), "(S)");
    assert_eq!(tree.total_chars(), 0);
    assert_eq!(tree.root().child_count(), 0);
}

#[test]
fn parsing_is_deterministic() {
    let first = parse(two_token_language(), "ab");
    let second = parse(two_token_language(), "ab");
    assert_eq!(first.sexp(), second.sexp());

    let first = parse(expression_language(), "n+n*n");
    let second = parse(expression_language(), "n+n*n");
    assert_eq!(first.sexp(), second.sexp());
}

#[test]
fn parse_without_a_language_returns_none() {
    let mut parser = Parser::new();
    assert!(parser.parse(Box::new(StringInput::new("ab")), None).is_none());
}

#[test]
fn debug_sink_observes_the_parse_without_affecting_it() {
    let messages: Arc<Mutex<Vec<(DebugEvent, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);

    let mut parser = parser_for(two_token_language());
    parser.set_debugger(Some(Debugger::new(move |event, message| {
        sink.lock().unwrap().push((event, message.to_string()));
    })));

    let tree = parser
        .parse(Box::new(StringInput::new("ab")), None)
        .unwrap();
    assert_eq!(tree.sexp(), "(S (a) (b))");

    let messages = messages.lock().unwrap();
    assert_eq!(messages.first().map(|(_, m)| m.as_str()), Some("new_parse"));
    assert!(messages.iter().any(|(_, m)| m.starts_with("shift state:")));
    assert!(messages.iter().any(|(_, m)| m.starts_with("reduce sym:S")));
    assert!(messages.iter().any(|(_, m)| m == "accept"));
    assert!(messages.iter().any(|(e, _)| *e == DebugEvent::Lex));
}

#[test]
fn input_chunking_does_not_change_the_result() {
    for chunk_size in [1, 2, 3, 64] {
        let mut parser = parser_for(expression_language());
        let tree = parser
            .parse(Box::new(StringInput::with_chunk_size("n+n*n", chunk_size)), None)
            .unwrap();
        assert_eq!(
            tree.sexp(),
            "(E (E (n)) (\"+\") (E (E (n)) (\"*\") (E (n))))",
            "chunk size {chunk_size}"
        );
    }
}
