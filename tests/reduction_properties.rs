//! Integration tests for variable analysis, substitution and single-step reduction
//!
//! These exercise the public arena API the way an embedding application would:
//! parse a term, inspect it, and rewrite it in place.

use lamedh::{
    EvalConfig, Evaluator, ExprArena, LambdaError, NodeId, RedexOrder, SubstitutionMap,
    parse_expression,
};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashSet;

fn parsed(source: &str) -> (ExprArena, NodeId) {
    let mut arena = ExprArena::new();
    let root = parse_expression(&mut arena, source).unwrap();
    (arena, root)
}

fn shown(arena: &ExprArena, id: NodeId) -> String {
    arena.display(id).to_string()
}

#[test]
fn test_substitution_renames_capturing_binder() {
    let (mut arena, term) = parsed("λw.z");
    let replacement = arena.var("w");
    let mut map = SubstitutionMap::default();
    map.insert("z".to_string(), replacement);

    let result = arena.substitute(term, &map);
    assert_eq!(shown(&arena, result), "(λw1.w)");
    // the input is left as it was
    assert_eq!(shown(&arena, term), "(λw.z)");
}

#[test]
fn test_renamed_binder_does_not_collide_with_a_nested_binder() {
    // renaming x to x1 would let the inner λx1 capture the substituted x
    let (mut arena, term) = parsed("(λz.λx.λx1.(x z)) x a b");
    let evaluator = Evaluator::new(EvalConfig::default());
    let result = evaluator.goto_normal_form(&mut arena, term).unwrap();
    assert_eq!(shown(&arena, result), "(a x)");
}

#[test]
fn test_single_step_reduction_of_a_root_redex() {
    let (mut arena, redex) = parsed("(λx.x) y");
    assert!(arena.is_redex(redex));

    let result = arena.reduce(redex).unwrap();
    assert_eq!(shown(&arena, result), "y");
    assert_eq!(arena.parent(result), None);
    assert!(arena.is_normal_form(result));
}

#[test]
fn test_reduction_splices_into_parent() {
    let (mut arena, root) = parsed("f ((λx.x) y)");
    let redexes = arena.find_redexes(root, RedexOrder::OutermostFirst);
    assert_eq!(redexes.len(), 1);

    let result = arena.reduce(redexes[0]).unwrap();
    assert_eq!(arena.parent(result), Some(root));
    assert_eq!(shown(&arena, root), "(f y)");
}

#[test]
fn test_repeated_reduction() {
    let (mut arena, root) = parsed("(λx.x) ((λx.x) y)");
    let once = arena.reduce(root).unwrap();
    assert_eq!(shown(&arena, once), "((λx.x) y)");
    let twice = arena.reduce(once).unwrap();
    assert_eq!(shown(&arena, twice), "y");
}

#[test]
fn test_reducing_a_non_redex_fails() {
    let (mut arena, root) = parsed("x y");
    let err = arena.reduce(root).unwrap_err();
    assert_eq!(
        err,
        LambdaError::CantReduce {
            term: "(x y)".to_string()
        }
    );
}

#[test]
fn test_redex_orders() {
    let (arena, root) = parsed("(λa.((λb.b) a)) ((λc.c) d)");
    let outermost: Vec<String> = arena
        .find_redexes(root, RedexOrder::OutermostFirst)
        .into_iter()
        .map(|id| shown(&arena, id))
        .collect();
    let innermost: Vec<String> = arena
        .find_redexes(root, RedexOrder::InnermostFirst)
        .into_iter()
        .map(|id| shown(&arena, id))
        .collect();

    assert_eq!(
        outermost,
        vec![
            "((λa.((λb.b) a)) ((λc.c) d))",
            "((λb.b) a)",
            "((λc.c) d)",
        ]
    );
    assert_eq!(
        innermost,
        vec![
            "((λb.b) a)",
            "((λc.c) d)",
            "((λa.((λb.b) a)) ((λc.c) d))",
        ]
    );
}

#[test]
fn test_free_variables_of_a_variable() {
    let (arena, root) = parsed("x");
    let expected: FxHashSet<NodeId> = [root].into_iter().collect();
    assert_eq!(arena.free_vars(root), expected);
}

#[test]
fn test_free_variables_of_an_abstraction() {
    let (arena, root) = parsed("λx.((x y) (λz.x))");
    let body = arena.children(root)[0];
    let expected: FxHashSet<NodeId> = arena
        .free_vars(body)
        .into_iter()
        .filter(|&id| shown(&arena, id) != "x")
        .collect();
    assert_eq!(arena.free_vars(root), expected);
    let names: FxHashSet<String> = ["y".to_string()].into_iter().collect();
    assert_eq!(arena.free_var_names(root), names);
}

#[test]
fn test_free_variables_of_an_application() {
    let (arena, root) = parsed("(a x) (λa.(a b))");
    let children = arena.children(root);
    let mut expected = arena.free_vars(children[0]);
    expected.extend(arena.free_vars(children[1]));
    assert_eq!(arena.free_vars(root), expected);
    assert_eq!(arena.free_vars(root).len(), 3);
}

#[test]
fn test_rename_abstraction_skips_inner_rebinding() {
    let (mut arena, root) = parsed("λx.(x (λx.x))");
    arena.rename(root, "z").unwrap();
    assert_eq!(shown(&arena, root), "(λz.(z (λx.x)))");
}

#[test]
fn test_rename_rejects_other_nodes() {
    let (mut arena, root) = parsed("x y");
    let err = arena.rename(root, "z").unwrap_err();
    assert_eq!(err.kind(), "CantRename");
}

#[test]
fn test_release_returns_slots() {
    let (mut arena, root) = parsed("(λx.x) y");
    let copy = arena.deep_clone(root);
    let before = arena.len();
    arena.release(copy);
    assert_eq!(arena.len(), before - 4);
    assert!(!arena.contains(copy));
    assert_eq!(shown(&arena, root), "((λx.x) y)");

    // the vacated slots back the next allocations
    let allocated = arena.allocated();
    let again = arena.deep_clone(root);
    assert_eq!(arena.allocated(), allocated);
    assert!(!arena.contains(copy));
    assert_eq!(shown(&arena, again), "((λx.x) y)");
}
