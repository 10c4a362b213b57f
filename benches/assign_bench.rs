//! Criterion benchmarks for u-assign solvers.
//!
//! Uses synthetic cohorts over the observation-subject catalog so both
//! solvers see the same preference and capacity shapes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use u_assign::assign::AssignRunner;
use u_assign::catalog::OBSERVATION_SUBJECTS;
use u_assign::config::{AssignConfig, SolverKind};
use u_assign::preference::PreferenceRow;

// ===========================================================================
// Synthetic cohorts
// ===========================================================================

/// `n` agents with three distinct random choices each, seeded.
fn cohort(n: usize, seed: u64) -> Vec<PreferenceRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let mut subjects = OBSERVATION_SUBJECTS.to_vec();
            subjects.shuffle(&mut rng);
            PreferenceRow::new(format!("{}", 1000 + i), subjects.into_iter().take(3))
        })
        .collect()
}

/// Default limits scaled so that `n` agents always fit.
fn config_for(n: usize, kind: SolverKind) -> AssignConfig {
    let mut config = AssignConfig::new().with_catalog(OBSERVATION_SUBJECTS);
    let per = n.div_ceil(OBSERVATION_SUBJECTS.len());
    for name in OBSERVATION_SUBJECTS {
        config = config.with_capacity(name, per.saturating_sub(2), per + 1);
    }
    config.with_solver_kind(kind)
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_assign");

    for &n in &[30, 200, 1000] {
        let rows = cohort(n, 42);
        let config = config_for(n, SolverKind::Flow);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(config, rows), |b, (c, r)| {
            b.iter(|| {
                let report = AssignRunner::run(black_box(c), black_box(r));
                black_box(report)
            })
        });
    }
    group.finish();
}

fn bench_branch_and_bound(c: &mut Criterion) {
    let mut group = c.benchmark_group("branch_and_bound_assign");
    group.sample_size(10);

    for &n in &[10, 20, 30] {
        let rows = cohort(n, 42);
        let config = config_for(n, SolverKind::BranchAndBound).with_time_limit_ms(10_000);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(config, rows), |b, (c, r)| {
            b.iter(|| {
                let report = AssignRunner::run(black_box(c), black_box(r));
                black_box(report)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flow, bench_branch_and_bound);
criterion_main!(benches);
