use super::*;

#[test]
fn an_unexpected_character_becomes_an_error_node() {
    let tree = parse(two_token_language(), "ax");
    assert!(tree.root().is_error());
    assert_eq!(tree.total_chars(), 2);
    // The accepted 'a' survives inside the error root; the 'x' is the
    // lexer's one-character error leaf.
    assert_eq!(tree.sexp(), "(ERROR (a) (ERROR))");
    assert_eq!(tree.root().child(0).unwrap().name(), "a");
    assert_parent_consistency(&tree);
}

#[test]
fn garbage_input_still_produces_a_tree() {
    let tree = parse(two_token_language(), "xyz");
    assert_eq!(tree.total_chars(), 3);
    assert!(tree.root_tree().error_count() >= 1);
    assert_eq!(tree.sexp(), "(ERROR (ERROR) (ERROR) (ERROR))");
}

#[test]
fn empty_input_without_an_epsilon_rule_is_an_error_not_a_failure() {
    let tree = parse(two_token_language(), "");
    assert!(tree.root().is_error());
    assert_eq!(tree.total_chars(), 0);
    assert_eq!(tree.sexp(), "(ERROR)");
}

#[test]
fn recovery_resumes_after_the_damaged_region() {
    // "a;" parses, "x;" is damaged, the final "a;" parses cleanly again.
    let tree = parse(recovering_language(), "a;x;a;");
    assert_eq!(tree.total_chars(), 6);
    assert_eq!(
        tree.sexp(),
        "(S (S (P (ERROR (a) (\";\")) (ERROR) (\";\"))) (P (a) (\";\")))"
    );

    // Exactly one ERROR node and one lexer-error leaf.
    assert_eq!(tree.root_tree().error_count(), 2);

    // The statement after the error is intact.
    let root = tree.root();
    let last = root.child(root.child_count() - 1).unwrap();
    assert_eq!(last.name(), "P");
    assert_eq!(last.tree().error_count(), 0);
    assert_parent_consistency(&tree);
}

#[test]
fn error_trees_round_trip_through_reparse() {
    // Parsing the same damaged input twice gives identical trees.
    let first = parse(recovering_language(), "a;x;a;");
    let second = parse(recovering_language(), "a;x;a;");
    assert_eq!(first.sexp(), second.sexp());
}
