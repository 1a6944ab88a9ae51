//! Order book benchmarks.
//!
//! Run with: cargo bench -p quotebook-bench --bench book

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quotebook_bench::{Workload, WorkloadConfig};
use quotebook_core::{Precision, Side};
use quotebook_marketdata::{BboTracker, NoopObserver, OrderBook, PriceLevel, PriceLevelIndex};
use rust_decimal::Decimal;
use std::hint::black_box;

fn benchmark_price_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_key");
    group.throughput(Throughput::Elements(1));
    let precision = Precision::new(2).unwrap();

    group.bench_function("text", |b| {
        b.iter(|| black_box(precision.key(black_box("10101.1049999")).unwrap()))
    });

    group.bench_function("float", |b| {
        b.iter(|| black_box(precision.key(black_box(10101.1049999_f64)).unwrap()))
    });

    group.finish();
}

fn benchmark_level_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_index");
    group.throughput(Throughput::Elements(1));
    let precision = Precision::new(2).unwrap();

    for depth in [10_usize, 100, 1000] {
        let mut index = PriceLevelIndex::new(Side::Bid);
        index
            .replace_all((0..depth).map(|i| {
                PriceLevel::new(precision.key(i as f64).unwrap(), Decimal::ONE)
            }))
            .unwrap();
        let inside = precision.key(depth as f64 / 2.0).unwrap();

        group.bench_with_input(BenchmarkId::new("upsert_best", depth), &depth, |b, _| {
            b.iter(|| {
                index.upsert(black_box(inside), Decimal::TWO);
                black_box(index.best())
            })
        });
    }

    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_snapshot");

    for depth in [10_usize, 100, 1000] {
        let workload = Workload::generate(WorkloadConfig {
            depth,
            updates: 0,
            ..WorkloadConfig::default()
        })
        .unwrap();
        group.throughput(Throughput::Elements(2 * depth as u64));

        group.bench_with_input(BenchmarkId::from_parameter(depth), &workload, |b, w| {
            b.iter_batched(
                || OrderBook::new(w.instrument.id.clone(), w.instrument.precision),
                |mut book| {
                    book.apply_snapshot(&w.snapshot.bids, &w.snapshot.asks)
                        .unwrap();
                    black_box(book)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn benchmark_update_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_recompute");
    let workload = Workload::generate(WorkloadConfig::default()).unwrap();
    group.throughput(Throughput::Elements(workload.updates.len() as u64));

    group.bench_function("book_and_tracker", |b| {
        b.iter_batched(
            || {
                let mut book = OrderBook::new(
                    workload.instrument.id.clone(),
                    workload.instrument.precision,
                );
                book.apply_snapshot(&workload.snapshot.bids, &workload.snapshot.asks)
                    .unwrap();
                (book, BboTracker::new())
            },
            |(mut book, mut tracker)| {
                let mut observer = NoopObserver;
                for update in &workload.updates {
                    for change in &update.changes {
                        book.apply_update(change.side, &change.price, &change.size)
                            .unwrap();
                    }
                    black_box(tracker.recompute(&book, &mut observer));
                }
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("handler", |b| {
        b.iter_batched(
            || workload.populated_handler().unwrap(),
            |mut handler| {
                for update in &workload.updates {
                    black_box(handler.on_update(update).unwrap());
                }
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_price_key,
    benchmark_level_index,
    benchmark_snapshot,
    benchmark_update_recompute
);
criterion_main!(benches);
