//! Integration tests for the iterative drivers and the recursive evaluators

use lamedh::evaluator::{CollectingTraceProvider, NoOpTraceProvider, TraceProvider};
use lamedh::{EvalConfig, Evaluator, ExprArena, LambdaError, Strategy, parse_expression};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

const OMEGA: &str = "(λx.(x x)) (λx.(x x))";

fn evaluator(max_steps: usize) -> Evaluator {
    Evaluator::new(EvalConfig::default().with_max_steps(max_steps))
        .with_trace_provider(Arc::new(NoOpTraceProvider))
}

fn evaluate(source: &str, strategy: Strategy, max_steps: usize) -> Result<String, LambdaError> {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, source)?;
    let value = evaluator(max_steps).eval(&mut arena, term, strategy)?;
    Ok(arena.display(value).to_string())
}

#[test]
fn test_normal_order_skips_a_diverging_operand() {
    let source = "((λx.(λy.y)) ((λx.(x x)) (λx.(x x))))";
    assert_eq!(
        evaluate(source, Strategy::Normal, 10).unwrap(),
        "(λy.y)"
    );
    assert_eq!(
        evaluate(source, Strategy::Eager, 10).unwrap_err(),
        LambdaError::StepLimitExceeded { max_steps: 10 }
    );
}

#[test]
fn test_normal_form_of_church_arithmetic() {
    let mut arena = ExprArena::new();
    let term = parse_expression(
        &mut arena,
        "(((λf.λx.(f (f x))) (λz.λx.λy.((z y) x))) (λz.λw.z))",
    )
    .unwrap();
    let result = evaluator(25).goto_normal_form(&mut arena, term).unwrap();
    assert_eq!(arena.display(result).to_string(), "(λx1.(λy.x1))");
    assert!(arena.is_normal_form(result));
}

#[test]
fn test_normal_form_is_idempotent() {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, "(λm n f x.m (n f) x) (λf x.f x) (λf x.f (f x))")
        .unwrap();
    let evaluator = evaluator(100);
    let once = evaluator.goto_normal_form(&mut arena, term).unwrap();
    let twice = evaluator.goto_normal_form(&mut arena, once).unwrap();
    assert_eq!(
        arena.display(once).to_string(),
        arena.display(twice).to_string()
    );
}

#[test]
fn test_released_results_keep_the_arena_bounded() {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, "(λm n f x.m (n f) x) (λf x.f x) (λf x.f (f x))")
        .unwrap();
    let live = arena.len();
    let evaluator = evaluator(100);

    let first = evaluator.goto_normal_form(&mut arena, term).unwrap();
    arena.release(first);
    let high_water = arena.allocated();

    for _ in 0..1000 {
        let result = evaluator.goto_normal_form(&mut arena, term).unwrap();
        assert_eq!(
            arena.display(result).to_string(),
            "(λf.(λx.(f (f x))))"
        );
        arena.release(result);
    }
    assert_eq!(arena.len(), live);
    assert_eq!(arena.allocated(), high_water);
}

#[test]
fn test_canonical_form_leaves_body_alone() {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, "(λx.λy.(x ((λz.z) y))) f").unwrap();
    let result = evaluator(25).goto_canonical(&mut arena, term).unwrap();
    assert_eq!(
        arena.display(result).to_string(),
        "(λy.(f ((λz.z) y)))"
    );
}

#[rstest]
#[case::canonical("canonical")]
#[case::normal_form("normal_form")]
#[case::eval_normal("eval_normal")]
#[case::eval_eager("eval_eager")]
fn test_every_driver_honours_the_budget(#[case] driver: &str) {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, OMEGA).unwrap();
    let before = arena.len();
    let evaluator = evaluator(7);

    let result = match driver {
        "canonical" => evaluator.goto_canonical(&mut arena, term),
        "normal_form" => evaluator.goto_normal_form(&mut arena, term),
        "eval_normal" => evaluator.eval_normal(&mut arena, term),
        _ => evaluator.eval_eager(&mut arena, term),
    };

    assert_eq!(
        result.unwrap_err(),
        LambdaError::StepLimitExceeded { max_steps: 7 }
    );
    // no partial result is left behind
    assert_eq!(arena.len(), before);
    assert_eq!(
        arena.display(term).to_string(),
        "((λx.(x x)) (λx.(x x)))"
    );
}

#[rstest]
#[case("1 + 2 * 3", "7")]
#[case("if 3 <= 2 then false else 10 % 4 = 2", "true")]
#[case("let x := 4, y := 5 in x * y", "20")]
#[case("let x := 4 in let y := x + 1 in x * y", "20")]
#[case("let <q, r> := <17 / 5, 17 % 5> in q * 5 + r", "17")]
#[case("<false, λx.x>.1 or true", "true")]
#[case("(λf.f (f 3)) (λn.n + n)", "12")]
#[case(
    "letrec fact := λn. if n = 0 then 1 else n * fact (n - 1) in fact 5",
    "120"
)]
#[case(
    "letrec even := λn. if n = 0 then true else odd (n - 1), \
     odd := λn. if n = 0 then false else even (n - 1) in even 6",
    "true"
)]
#[case("(rec λf.λn. if n = 0 then 0 else n + f (n - 1)) 4", "10")]
fn test_applicative_programs(#[case] source: &str, #[case] expected: &str) {
    for strategy in [Strategy::Normal, Strategy::Eager] {
        assert_eq!(
            evaluate(source, strategy, 2_000).unwrap(),
            expected,
            "{strategy} evaluation of {source}"
        );
    }
}

#[rstest]
#[case("x", "CantEval")]
#[case("3 4", "CantEval")]
#[case("true + 1", "TypeError")]
#[case("typeerror", "TypeError")]
#[case("error", "Error")]
#[case("7 / 0", "Error")]
#[case("<1>.2", "CantEval")]
fn test_evaluation_failures(#[case] source: &str, #[case] kind: &str) {
    for strategy in [Strategy::Normal, Strategy::Eager] {
        let err = evaluate(source, strategy, 100).unwrap_err();
        assert_eq!(err.kind(), kind, "{strategy} evaluation of {source}");
    }
}

#[test]
fn test_verbose_evaluation_reports_value() {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, "(λx.x) 3").unwrap();
    let traces = Arc::new(CollectingTraceProvider::new());
    let evaluator = Evaluator::new(EvalConfig::default().with_verbose(true))
        .with_trace_provider(traces.clone());

    evaluator.eval_normal(&mut arena, term).unwrap();
    let lines = traces.collect_traces();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("-> ((λx.x) 3)"));
    assert!(lines[3].ends_with("((λx.x) 3) =N=> 3"));
}

#[test]
fn test_quiet_evaluation_traces_nothing() {
    let mut arena = ExprArena::new();
    let term = parse_expression(&mut arena, "(λx.x) 3").unwrap();
    let traces = Arc::new(CollectingTraceProvider::new());
    let evaluator = Evaluator::new(EvalConfig::default()).with_trace_provider(traces.clone());

    evaluator.eval_eager(&mut arena, term).unwrap();
    assert!(traces.collect_traces().is_empty());
}
