// ============================================================================
// Clearing Calculator Benchmarks
// ============================================================================
//
// Benchmark Categories:
// 1. Oversubscribed clearing - full sort + marginal-tier pro-rata split
// 2. Undersubscribed clearing - sort + full allocation fast path
// 3. Single-tier pro-rata - every bid lands on the marginal price
// ============================================================================

use auction_engine::domain::clearing::BidSnapshot;
use auction_engine::numeric::Price;
use auction_engine::prelude::*;
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic bid pool: prices cycle over a band, quantities vary
fn make_bids(count: usize, price_levels: i64) -> Vec<BidSnapshot> {
    let base = Utc::now();
    (0..count)
        .map(|i| BidSnapshot {
            bidder_id: BidderId::new(),
            quantity_requested: 10 + (i as u64 % 90),
            max_price: Price::from_integer(60 + (i as i64 % price_levels)).unwrap(),
            bid_time: base + Duration::seconds(i as i64),
        })
        .collect()
}

fn benchmark_oversubscribed(c: &mut Criterion) {
    let mut group = c.benchmark_group("clearing_oversubscribed");

    for num_bids in [10, 100, 1000].iter() {
        let bids = make_bids(*num_bids, 80);
        let total_demand: u64 = bids.iter().map(|b| b.quantity_requested).sum();
        // Supply covers roughly a quarter of demand
        let supply = (total_demand / 4).max(1);
        let floor = Price::from_integer(50).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(num_bids),
            &(&bids, supply),
            |b, (bids, supply)| {
                b.iter(|| black_box(compute_clearing(bids, *supply, floor).unwrap()));
            },
        );
    }

    group.finish();
}

fn benchmark_undersubscribed(c: &mut Criterion) {
    let mut group = c.benchmark_group("clearing_undersubscribed");

    for num_bids in [10, 100, 1000].iter() {
        let bids = make_bids(*num_bids, 80);
        let total_demand: u64 = bids.iter().map(|b| b.quantity_requested).sum();
        let supply = total_demand * 2;
        let floor = Price::from_integer(50).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(num_bids),
            &(&bids, supply),
            |b, (bids, supply)| {
                b.iter(|| black_box(compute_clearing(bids, *supply, floor).unwrap()));
            },
        );
    }

    group.finish();
}

fn benchmark_single_tier_pro_rata(c: &mut Criterion) {
    let mut group = c.benchmark_group("clearing_single_tier");

    for num_bids in [10, 100, 1000].iter() {
        // Every bid at the same price: the whole pool is the marginal tier
        let bids = make_bids(*num_bids, 1);
        let total_demand: u64 = bids.iter().map(|b| b.quantity_requested).sum();
        let supply = (total_demand / 2).max(1);
        let floor = Price::from_integer(50).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(num_bids),
            &(&bids, supply),
            |b, (bids, supply)| {
                b.iter(|| black_box(compute_clearing(bids, *supply, floor).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_oversubscribed,
    benchmark_undersubscribed,
    benchmark_single_tier_pro_rata
);
criterion_main!(benches);
