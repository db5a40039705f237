//! Benchmarks for the indicator engine.

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use midgrid_core::traits::Indicator;
use midgrid_core::types::{BarSeries, PriceBar};
use midgrid_indicators::{IndicatorEngine, IndicatorParams, Mpmi, Sma};

fn generate_series(size: usize) -> BarSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let bars = (0..size)
        .map(|i| {
            let mid = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let half = 1.0 + (i as f64 * 0.37).cos().abs();
            PriceBar::new(start + Days::new(i as u64), mid, mid + half, mid - half, mid, 1_000)
        })
        .collect();
    BarSeries::new("BENCH", bars).unwrap()
}

fn benchmark_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("IndicatorEngine");
    let engine = IndicatorEngine::new(IndicatorParams::default()).unwrap();

    for size in [1000, 10000].iter() {
        let series = generate_series(*size);
        group.bench_with_input(BenchmarkId::new("compute", size), &series, |b, series| {
            b.iter(|| engine.compute(black_box(series)))
        });
    }

    group.finish();
}

fn benchmark_components(c: &mut Criterion) {
    let series = generate_series(10000);
    let mids: Vec<f64> = series.mid_prices();

    c.bench_function("SMA/10000", |b| {
        let sma = Sma::new(10);
        b.iter(|| sma.calculate(black_box(&mids)))
    });
    c.bench_function("MPMI/10000", |b| {
        let mpmi = Mpmi::new();
        b.iter(|| mpmi.calculate(black_box(&mids)))
    });
}

criterion_group!(benches, benchmark_engine, benchmark_components);
criterion_main!(benches);
