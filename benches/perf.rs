use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use xg_terminal::binom::{AnalysisInput, binomial_pmf, compute_distribution};
use xg_terminal::config::AppConfig;
use xg_terminal::state::AppState;

fn bench_distribution_default(c: &mut Criterion) {
    let input = AnalysisInput::new(5.0, 20, 3, "Player");
    c.bench_function("distribution_default", |b| {
        b.iter(|| {
            let dist = compute_distribution(black_box(&input)).unwrap();
            black_box(dist.prob_at_least_observed);
        })
    });
}

fn bench_distribution_max_slider(c: &mut Criterion) {
    let input = AnalysisInput::new(20.0, 100, 50, "Player");
    c.bench_function("distribution_max_slider", |b| {
        b.iter(|| {
            let dist = compute_distribution(black_box(&input)).unwrap();
            black_box(dist.cdf.len());
        })
    });
}

fn bench_pmf_large_n(c: &mut Criterion) {
    c.bench_function("pmf_large_n", |b| {
        b.iter(|| {
            let pmf = binomial_pmf(black_box(10_000), black_box(0.12));
            black_box(pmf.len());
        })
    });
}

fn bench_analyze_action(c: &mut Criterion) {
    let mut state = AppState::new(&AppConfig::default());
    c.bench_function("analyze_action", |b| {
        b.iter(|| {
            state.analyze().unwrap();
            black_box(state.chart.as_ref().map(|chart| chart.title.len()));
        })
    });
}

criterion_group!(
    perf,
    bench_distribution_default,
    bench_distribution_max_slider,
    bench_pmf_large_n,
    bench_analyze_action
);
criterion_main!(perf);
