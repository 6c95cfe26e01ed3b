//! Criterion benchmarks for candidate generation and binding hot paths.
//!
//! Benchmarks:
//! 1. Grid expansion (lazy iteration over spaces of increasing size)
//! 2. Random sampling (population initialization)
//! 3. Binding (indexed name-based writes into a nested condition tree)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use stratopt_core::{
    grid_iter, initialize_population, Binder, Candidate, ConditionNode, OptimizationParameter,
    ParameterSpace, StrategyTemplate,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_space(dims: usize, values_per_dim: usize) -> ParameterSpace {
    let params = (0..dims)
        .map(|i| {
            OptimizationParameter::range(format!("p{i}"), 0.0, (values_per_dim - 1) as f64, 1.0)
        })
        .collect();
    ParameterSpace::new(params).unwrap()
}

fn make_template(depth: usize, fan_out: usize) -> StrategyTemplate {
    fn node(depth: usize, fan_out: usize) -> ConditionNode {
        if depth == 0 {
            return ConditionNode::group([
                ("period", ConditionNode::Number(14.0)),
                ("threshold", ConditionNode::Number(0.5)),
            ]);
        }
        ConditionNode::group(
            (0..fan_out).map(|i| (format!("c{i}"), node(depth - 1, fan_out))),
        )
    }
    StrategyTemplate {
        name: "bench".into(),
        symbol: "SPY".into(),
        timeframe: "1D".into(),
        conditions: node(depth, fan_out),
    }
}

// ── 1. Grid expansion ────────────────────────────────────────────────

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_expansion");

    for &dims in &[2, 4, 6] {
        let space = make_space(dims, 5);
        group.bench_with_input(BenchmarkId::new("dims", dims), &dims, |b, _| {
            b.iter(|| grid_iter(black_box(&space)).count());
        });
    }

    group.finish();
}

// ── 2. Random sampling ───────────────────────────────────────────────

fn bench_sampling(c: &mut Criterion) {
    let space = make_space(6, 50);
    c.bench_function("initialize_population_100", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            initialize_population(black_box(&space), 100, &mut rng)
        });
    });
}

// ── 3. Binding ───────────────────────────────────────────────────────

fn bench_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    let candidate: Candidate = [("period", 21.0), ("threshold", 0.7)].into_iter().collect();

    for &depth in &[2, 4] {
        let binder = Binder::new(make_template(depth, 4));
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, _| {
            b.iter(|| binder.bind(black_box(&candidate)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grid, bench_sampling, bench_binding);
criterion_main!(benches);
