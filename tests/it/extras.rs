use super::*;

#[test]
fn interior_whitespace_stays_out_of_the_rendered_production() {
    let tree = parse(extras_language(), "a  b");
    assert_eq!(tree.sexp(), "(S (a) (b))");
    assert_eq!(tree.total_chars(), 4);

    // The whitespace is attached between the tokens as an invisible extra.
    let root = tree.root();
    assert_eq!(root.child_count(), 3);
    let ws = root.child(1).unwrap();
    assert!(ws.is_extra());
    assert!(!ws.tree().is_visible());
}

#[test]
fn trailing_extras_become_siblings_under_the_root() {
    // Reducing `S → 'a' 'b'` must not absorb the trailing whitespace into
    // the production; it is re-pushed and spliced in under the root.
    let tree = parse(extras_language(), "a b ");
    assert_eq!(tree.sexp(), "(S (a) (b))");
    assert_eq!(tree.total_chars(), 4);

    let root = tree.root();
    assert_eq!(root.child_count(), 4);
    assert!(root.child(3).unwrap().is_extra());
    assert!(!root.child(2).unwrap().is_extra());
}

#[test]
fn leading_extras_are_spliced_in_as_well() {
    let tree = parse(extras_language(), " ab");
    assert_eq!(tree.sexp(), "(S (a) (b))");
    assert_eq!(tree.total_chars(), 3);

    let root = tree.root();
    assert_eq!(root.child_count(), 3);
    assert!(root.child(0).unwrap().is_extra());
    assert_parent_consistency(&tree);
}
