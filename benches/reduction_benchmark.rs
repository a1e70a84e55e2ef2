use criterion::{Criterion, criterion_group, criterion_main};
use lamedh::evaluator::NoOpTraceProvider;
use lamedh::{EvalConfig, Evaluator, ExprArena, Strategy, parse, parse_expression};
use std::hint::black_box;
use std::sync::Arc;

const CHURCH_PRODUCT: &str =
    "(λm n f x.m (n f) x) (λf x.f (f x)) (λf x.f (f (f x)))";
const FACTORIAL: &str =
    "letrec fact := λn. if n = 0 then 1 else n * fact (n - 1) in fact 8";

fn evaluator() -> Evaluator {
    Evaluator::new(EvalConfig::default().with_max_steps(100_000))
        .with_trace_provider(Arc::new(NoOpTraceProvider))
}

fn benchmark_parser(c: &mut Criterion) {
    c.bench_function("parse_church_product", |b| {
        b.iter(|| black_box(parse(black_box(CHURCH_PRODUCT))))
    });
    c.bench_function("parse_factorial", |b| {
        b.iter(|| black_box(parse(black_box(FACTORIAL))))
    });
}

fn benchmark_normal_form(c: &mut Criterion) {
    let evaluator = evaluator();

    c.bench_function("normal_form_church_product", |b| {
        b.iter(|| {
            let mut arena = ExprArena::new();
            let term = parse_expression(&mut arena, CHURCH_PRODUCT).unwrap();
            black_box(evaluator.goto_normal_form(&mut arena, term).unwrap())
        })
    });
}

fn benchmark_recursive_evaluation(c: &mut Criterion) {
    let evaluator = evaluator();

    for strategy in [Strategy::Normal, Strategy::Eager] {
        c.bench_function(&format!("factorial_{strategy}"), |b| {
            b.iter(|| {
                let mut arena = ExprArena::new();
                let term = parse_expression(&mut arena, FACTORIAL).unwrap();
                black_box(evaluator.eval(&mut arena, term, strategy).unwrap())
            })
        });
    }
}

criterion_group!(
    benches,
    benchmark_parser,
    benchmark_normal_form,
    benchmark_recursive_evaluation
);
criterion_main!(benches);
