//! Benchmarks for the grid simulator.

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use midgrid_backtest::{BacktestConfig, GridSimulator};
use midgrid_core::types::{BarSeries, PriceBar};
use midgrid_strategy::{build, SpacingMode};
use rust_decimal_macros::dec;

fn generate_series(size: usize) -> BarSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let bars = (0..size)
        .map(|i| {
            let mid = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            PriceBar::new(start + Days::new(i as u64), mid, mid + 1.0, mid - 1.0, mid, 1_000)
        })
        .collect();
    BarSeries::new("BENCH", bars).unwrap()
}

fn benchmark_simulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("GridSimulator");
    let config = BacktestConfig {
        initial_cash: dec!(1000000),
        unit_quantity: dec!(10),
    };

    for levels in [10, 50].iter() {
        let series = generate_series(5000);
        let plan = build(85.0, 115.0, *levels, SpacingMode::Uniform, None, 100.0).unwrap();

        group.bench_with_input(BenchmarkId::new("run", levels), &series, |b, series| {
            b.iter(|| {
                GridSimulator::new(plan.clone(), config.clone())
                    .run(black_box(series))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_simulator);
criterion_main!(benches);
