use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

use venue_matching::{now, run, Order, OrderBook, OrderType, Side, TradeId};

fn test_order(side: Side, order_type: OrderType, price: Option<i64>, qty: u64, seq: u64) -> Order {
    Order {
        id: Uuid::new_v4(),
        symbol: "BTC-USD".to_string(),
        side,
        order_type,
        price,
        original_qty: qty,
        remaining_qty: qty,
        sequence: seq,
        arrival_time: now(),
    }
}

struct Counters {
    trade: TradeId,
}

impl Counters {
    fn new() -> Self {
        Self { trade: 0 }
    }
    fn trade_fn(&mut self) -> TradeId {
        self.trade += 1;
        self.trade
    }
}

fn bench_resting_limit_no_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_core");

    group.bench_function("resting_limit_no_opposite_liquidity", |b| {
        let mut book = OrderBook::new("BTC-USD");
        let mut counters = Counters::new();
        let mut seq = 0u64;
        b.iter(|| {
            seq += 1;
            let order = test_order(Side::Buy, OrderType::Limit, Some(100 - (seq as i64 % 50)), 1, seq);
            black_box(run(&mut book, &order, &mut || counters.trade_fn()));
        });
    });

    group.finish();
}

fn bench_sweeping_deep_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_core");

    group.bench_function("limit_sweeps_100_resting_asks", |b| {
        b.iter_with_setup(
            || {
                let mut book = OrderBook::new("BTC-USD");
                let mut counters = Counters::new();
                for i in 0..100i64 {
                    let maker = test_order(Side::Sell, OrderType::Limit, Some(100 + i), 1, i as u64);
                    run(&mut book, &maker, &mut || counters.trade_fn());
                }
                (book, counters)
            },
            |(mut book, mut counters)| {
                let taker = test_order(Side::Buy, OrderType::Limit, Some(500), 100, 10_000);
                black_box(run(&mut book, &taker, &mut || counters.trade_fn()));
            },
        )
    });

    group.finish();
}

fn bench_fok_dry_run_over_deep_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_core");

    group.bench_function("fok_dry_run_then_fill", |b| {
        b.iter_with_setup(
            || {
                let mut book = OrderBook::new("BTC-USD");
                let mut counters = Counters::new();
                for i in 0..100i64 {
                    let maker = test_order(Side::Sell, OrderType::Limit, Some(100 + i), 5, i as u64);
                    run(&mut book, &maker, &mut || counters.trade_fn());
                }
                (book, counters)
            },
            |(mut book, mut counters)| {
                let taker = test_order(Side::Buy, OrderType::Fok, Some(500), 250, 10_000);
                black_box(run(&mut book, &taker, &mut || counters.trade_fn()));
            },
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resting_limit_no_match,
    bench_sweeping_deep_book,
    bench_fok_dry_run_over_deep_book,
);
criterion_main!(benches);
