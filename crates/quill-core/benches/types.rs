//! Benchmarks for core types and clocks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quill_core::clock::MonotonicClock;
use quill_core::traits::Clock;
use quill_core::types::{MarketTick, Side, Timestamp};

fn bench_timestamp_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("timestamp");

    group.bench_function("from_nanos", |b| {
        b.iter(|| Timestamp::from_nanos(black_box(1_000_000_000)));
    });

    let t1 = Timestamp::from_nanos(1_000_000_000);
    let t2 = Timestamp::from_nanos(500_000_000);

    group.bench_function("duration_since", |b| {
        b.iter(|| black_box(t1).duration_since(black_box(t2)));
    });

    group.bench_function("seconds_since", |b| {
        b.iter(|| black_box(t1).seconds_since(black_box(t2)));
    });

    group.finish();
}

fn bench_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock");

    let clock = MonotonicClock::new();
    group.bench_function("monotonic_now", |b| {
        b.iter(|| black_box(clock.now()));
    });

    group.finish();
}

fn bench_tick_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    let tick = MarketTick {
        mid_price: 100.0,
        bid_price: 99.95,
        ask_price: 100.05,
        bid_size: 50,
        ask_size: 40,
        depth_levels: 10,
        ..MarketTick::default()
    };

    group.bench_function("copy", |b| {
        b.iter(|| {
            let copied: MarketTick = black_box(tick);
            black_box(copied)
        });
    });

    group.finish();
}

fn bench_side_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("side");

    group.bench_function("opposite", |b| {
        b.iter(|| black_box(Side::Buy).opposite());
    });

    group.bench_function("sign", |b| {
        b.iter(|| black_box(Side::Buy).sign());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_timestamp_operations,
    bench_clock,
    bench_tick_copy,
    bench_side_operations
);
criterion_main!(benches);
