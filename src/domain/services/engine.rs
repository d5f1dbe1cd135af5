//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The engine facade: owns one order book per symbol, each exclusively driven
// by its own tokio task (an "actor") reached over a bounded mpsc channel
// carrying a oneshot reply. This keeps the matching core single-threaded per
// symbol without a lock, while letting different symbols match concurrently.
//
// | Component     | Description                                                        |
// |---------------|----------------------------------------------------------------------|
// | Engine        | Public facade: admission validation, dispatch, stats, event publish  |
// | SymbolHandle   | A channel to one symbol's actor plus its tick/lot config             |
// | SymbolActor    | Owns the OrderBook; runs the matching core against one command at a time |
// | Stats          | Process-wide counters exposed via stats()                            |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::error;
use uuid::Uuid;

use crate::domain::models::types::{
    now, Order, OrderId, OrderStatus, OrderType, ScaleError, Sequence, Side, SymbolConfig, Trade,
};
use crate::domain::services::events::{EngineEvent, EventBus};
use crate::domain::services::matching_engine::{resolve_status, run, MatchOutcome};
use crate::domain::services::orderbook::{Bbo, DepthSnapshot, OrderBook, OrderbookError};

/// Depth published on the book event topic after every submission.
const EVENT_SNAPSHOT_DEPTH: usize = 10;

/// The mailbox size of a single symbol's actor. A full mailbox applies
/// backpressure to `submit` rather than growing without bound.
const ACTOR_MAILBOX_CAPACITY: usize = 4096;

/// A rejection reason reported on the submission contract (SPEC_FULL §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownSymbol,
    NonPositiveQuantity,
    PriceOffTick,
    QuantityOffLot,
    MissingPrice,
    UnexpectedPriceForMarket,
    FokUnfillable,
    SymbolQuarantined,
}

/// Errors that escalate past the facade rather than being reported as an
/// ordinary rejected submission. Only a corrupt per-symbol book reaches
/// this; ordinary validation/FOK/quarantine-state rejections are instead
/// returned as `Ok(SubmitResponse { status: Rejected, .. })`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no symbol '{0}' is configured on this engine")]
    UnknownSymbol(String),

    #[error("symbol '{0}' actor is no longer running")]
    ActorGone(String),

    #[error("internal invariant violated for symbol {symbol}: {source}")]
    InternalInvariantViolation {
        symbol: String,
        #[source]
        source: OrderbookError,
    },
}

/// A submission, in decimal form, as received at the facade boundary
/// (SPEC_FULL §6).
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct TradeReport {
    pub trade_id: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub aggressor_side: Side,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub status: OrderStatus,
    pub order_id: OrderId,
    pub sequence: Sequence,
    pub trades: Vec<TradeReport>,
    pub remaining_quantity: Decimal,
    pub reason: Option<RejectReason>,
}

#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub total_orders_accepted: u64,
    pub total_orders_rejected: u64,
    pub total_trades: u64,
    pub total_matched_volume_per_symbol: HashMap<String, Decimal>,
    pub uptime: Duration,
}

#[derive(Default)]
struct StatsInner {
    total_orders_accepted: u64,
    total_orders_rejected: u64,
    total_trades: u64,
    total_matched_volume_per_symbol: HashMap<String, Decimal>,
}

struct Stats {
    inner: Mutex<StatsInner>,
    started_at: Instant,
}

impl Stats {
    fn new() -> Self {
        Self {
            inner: Mutex::new(StatsInner::default()),
            started_at: Instant::now(),
        }
    }

    fn record_accepted(&self) {
        self.inner.lock().total_orders_accepted += 1;
    }

    fn record_rejected(&self) {
        self.inner.lock().total_orders_rejected += 1;
    }

    fn record_trades(&self, symbol: &str, trades: &[Trade], config: &SymbolConfig) {
        if trades.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.total_trades += trades.len() as u64;
        let volume: Decimal = trades
            .iter()
            .map(|t| config.lots_to_qty(t.quantity))
            .sum();
        *inner
            .total_matched_volume_per_symbol
            .entry(symbol.to_string())
            .or_insert(Decimal::ZERO) += volume;
    }

    fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            total_orders_accepted: inner.total_orders_accepted,
            total_orders_rejected: inner.total_orders_rejected,
            total_trades: inner.total_trades,
            total_matched_volume_per_symbol: inner.total_matched_volume_per_symbol.clone(),
            uptime: self.started_at.elapsed(),
        }
    }
}

/// What a symbol's actor hands back for a `Submit` command. Every variant
/// carries the sequence the actor assigned this submission at dequeue time
/// (see `SymbolActor::handle_submit`), since the facade never gets to
/// assign one itself.
enum ActorOutcome {
    Processed {
        sequence: Sequence,
        status: OrderStatus,
        trades: Vec<Trade>,
        remaining_qty: u64,
        book_snapshot: DepthSnapshot,
    },
    /// This submission is the one that tripped an invariant check; the
    /// caller must escalate and the symbol is now quarantined.
    FirstQuarantine { sequence: Sequence, source: OrderbookError },
    /// The symbol was already quarantined by an earlier submission.
    AlreadyQuarantined { sequence: Sequence },
}

enum ActorCommand {
    Submit {
        order: Order,
        reply: oneshot::Sender<ActorOutcome>,
    },
    Snapshot {
        depth: usize,
        reply: oneshot::Sender<DepthSnapshot>,
    },
    Bbo {
        reply: oneshot::Sender<Bbo>,
    },
}

/// Owns one symbol's `OrderBook` for the lifetime of its actor task. Every
/// method here runs inside that task; nothing outside ever touches `book`.
///
/// `sequence` is the engine-wide counter shared with every other symbol's
/// actor and with the facade's own front-door rejections. Assigning a
/// submission's sequence number happens here, at dequeue time, rather than
/// in `Engine::submit` before the send — the facade enqueuing a command and
/// this actor draining it one at a time are the only two places sequence
/// order can diverge from arrival order, and folding "assign" into "the one
/// place that dequeues serially" removes the gap between them (two
/// concurrent `submit` calls can no longer have their mailbox arrival order
/// disagree with the order their sequence numbers were handed out in).
struct SymbolActor {
    book: OrderBook,
    sequence: Arc<AtomicU64>,
    trade_ids: Arc<AtomicU64>,
    quarantined: bool,
    /// The sequence most recently assigned to a submission this actor has
    /// processed; used to tag ad-hoc snapshot/BBO queries that aren't
    /// themselves a submission.
    last_sequence: Sequence,
}

impl SymbolActor {
    fn handle_submit(&mut self, mut order: Order) -> ActorOutcome {
        order.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_sequence = order.sequence;

        if self.quarantined {
            return ActorOutcome::AlreadyQuarantined { sequence: order.sequence };
        }

        let trade_ids = &self.trade_ids;
        let outcome: MatchOutcome = run(&mut self.book, &order, &mut || {
            trade_ids.fetch_add(1, Ordering::SeqCst) + 1
        });

        if let Err(violation) = self.book.check_invariants() {
            self.quarantined = true;
            return ActorOutcome::FirstQuarantine {
                sequence: order.sequence,
                source: violation,
            };
        }

        let status = resolve_status(order.order_type, order.original_qty, &outcome);
        let book_snapshot = self.book.snapshot_dto(EVENT_SNAPSHOT_DEPTH, order.sequence);
        ActorOutcome::Processed {
            sequence: order.sequence,
            status,
            trades: outcome.trades,
            remaining_qty: outcome.remaining_qty,
            book_snapshot,
        }
    }
}

async fn run_actor(symbol: String, sequence: Arc<AtomicU64>, trade_ids: Arc<AtomicU64>, mut rx: mpsc::Receiver<ActorCommand>) {
    let mut actor = SymbolActor {
        book: OrderBook::new(symbol.clone()),
        sequence,
        trade_ids,
        quarantined: false,
        last_sequence: 0,
    };
    while let Some(cmd) = rx.recv().await {
        match cmd {
            ActorCommand::Submit { order, reply } => {
                let outcome = actor.handle_submit(order);
                if let ActorOutcome::FirstQuarantine { ref source, .. } = outcome {
                    error!(symbol = %symbol, %source, "internal invariant violated; quarantining symbol");
                }
                let _ = reply.send(outcome);
            }
            ActorCommand::Snapshot { depth, reply } => {
                let _ = reply.send(actor.book.snapshot_dto(depth, actor.last_sequence));
            }
            ActorCommand::Bbo { reply } => {
                let _ = reply.send(actor.book.bbo_dto());
            }
        }
    }
}

struct SymbolHandle {
    sender: mpsc::Sender<ActorCommand>,
    config: SymbolConfig,
}

/// The engine facade. Cheaply cloneable: every field is an `Arc`-backed
/// handle, so sharing an `Engine` across the HTTP transport's request
/// handlers is just a clone.
#[derive(Clone)]
pub struct Engine {
    symbols: Arc<HashMap<String, SymbolHandle>>,
    event_bus: EventBus,
    stats: Arc<Stats>,
    sequence: Arc<AtomicU64>,
}

impl Engine {
    /// Spawns one actor task per entry in `configs`. The symbol set is fixed
    /// for the engine's lifetime (SPEC_FULL §9: the tick/lot table is
    /// required at startup).
    pub fn new(configs: Vec<SymbolConfig>, event_bus_capacity: usize) -> Self {
        let sequence = Arc::new(AtomicU64::new(0));
        let trade_ids = Arc::new(AtomicU64::new(0));
        let event_bus = EventBus::new(event_bus_capacity);

        let mut symbols = HashMap::with_capacity(configs.len());
        for config in configs {
            let (tx, rx) = mpsc::channel(ACTOR_MAILBOX_CAPACITY);
            tokio::spawn(run_actor(
                config.symbol.clone(),
                Arc::clone(&sequence),
                Arc::clone(&trade_ids),
                rx,
            ));
            symbols.insert(
                config.symbol.clone(),
                SymbolHandle {
                    sender: tx,
                    config,
                },
            );
        }

        Self {
            symbols: Arc::new(symbols),
            event_bus,
            stats: Arc::new(Stats::new()),
            sequence,
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.event_bus.subscribe()
    }

    fn next_sequence(&self) -> Sequence {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Admission validation per SPEC_FULL §4.4: unknown symbol, non-positive
    /// quantity, price required-but-missing or present-but-forbidden, and
    /// tick/lot grid violations. Returns the order's price in ticks and
    /// quantity in lots once every check has passed.
    fn validate(config: &SymbolConfig, request: &SubmitRequest) -> Result<(Option<i64>, u64), RejectReason> {
        if request.quantity <= Decimal::ZERO {
            return Err(RejectReason::NonPositiveQuantity);
        }
        let requires_price = request.order_type.requires_price();
        match (requires_price, request.price) {
            (true, None) => return Err(RejectReason::MissingPrice),
            (false, Some(_)) => return Err(RejectReason::UnexpectedPriceForMarket),
            _ => {}
        }

        let price_ticks = match request.price {
            Some(price) => Some(
                config
                    .price_to_ticks(price)
                    .map_err(|_: ScaleError| RejectReason::PriceOffTick)?,
            ),
            None => None,
        };
        let qty_lots = config
            .qty_to_lots(request.quantity)
            .map_err(|_| RejectReason::QuantityOffLot)?;

        Ok((price_ticks, qty_lots))
    }

    fn rejected_response(sequence: Sequence, order_id: OrderId, reason: RejectReason) -> SubmitResponse {
        SubmitResponse {
            status: OrderStatus::Rejected,
            order_id,
            sequence,
            trades: Vec::new(),
            remaining_quantity: Decimal::ZERO,
            reason: Some(reason),
        }
    }

    /// Validates, assigns a sequence and order id, routes to the symbol's
    /// actor, and publishes events once matching returns. Ordinary
    /// rejections (unknown symbol, off-grid price/quantity, FOK-unfillable,
    /// a previously quarantined symbol) come back as `Ok` with
    /// `status: Rejected`; only a *newly detected* invariant violation
    /// escalates as `Err`.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, EngineError> {
        let order_id = Uuid::new_v4();

        let Some(handle) = self.symbols.get(&request.symbol) else {
            self.stats.record_rejected();
            let sequence = self.next_sequence();
            return Ok(Self::rejected_response(sequence, order_id, RejectReason::UnknownSymbol));
        };

        let (price_ticks, qty_lots) = match Self::validate(&handle.config, &request) {
            Ok(v) => v,
            Err(reason) => {
                self.stats.record_rejected();
                let sequence = self.next_sequence();
                return Ok(Self::rejected_response(sequence, order_id, reason));
            }
        };

        // `sequence` is intentionally left unassigned here: the symbol's
        // actor assigns it at dequeue time so assignment and mailbox order
        // can never diverge (see `SymbolActor::handle_submit`).
        let order = Order {
            id: order_id,
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            price: price_ticks,
            original_qty: qty_lots,
            remaining_qty: qty_lots,
            sequence: 0,
            arrival_time: now(),
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .sender
            .send(ActorCommand::Submit { order, reply: reply_tx })
            .await
            .map_err(|_| EngineError::ActorGone(request.symbol.clone()))?;
        let outcome = reply_rx
            .await
            .map_err(|_| EngineError::ActorGone(request.symbol.clone()))?;

        match outcome {
            ActorOutcome::AlreadyQuarantined { sequence } => {
                self.stats.record_rejected();
                Ok(Self::rejected_response(sequence, order_id, RejectReason::SymbolQuarantined))
            }
            ActorOutcome::FirstQuarantine { source, .. } => {
                self.stats.record_rejected();
                Err(EngineError::InternalInvariantViolation {
                    symbol: request.symbol,
                    source,
                })
            }
            ActorOutcome::Processed {
                sequence,
                status,
                trades,
                remaining_qty,
                book_snapshot,
            } => {
                let reason = (status == OrderStatus::Rejected).then_some(RejectReason::FokUnfillable);
                if status == OrderStatus::Rejected {
                    self.stats.record_rejected();
                } else {
                    self.stats.record_accepted();
                    self.stats.record_trades(&request.symbol, &trades, &handle.config);
                }

                for trade in &trades {
                    self.event_bus.publish(EngineEvent::Trade(trade.clone()));
                }
                if !trades.is_empty() || request.order_type == OrderType::Limit {
                    self.event_bus.publish(EngineEvent::Book(book_snapshot));
                }

                let trade_reports = trades
                    .iter()
                    .map(|t| TradeReport {
                        trade_id: t.trade_id,
                        price: handle.config.ticks_to_price(t.price),
                        quantity: handle.config.lots_to_qty(t.quantity),
                        aggressor_side: t.aggressor_side,
                        maker_order_id: t.maker_order_id,
                        taker_order_id: t.taker_order_id,
                        timestamp: t.timestamp,
                    })
                    .collect();

                Ok(SubmitResponse {
                    status,
                    order_id,
                    sequence,
                    trades: trade_reports,
                    remaining_quantity: handle.config.lots_to_qty(remaining_qty),
                    reason,
                })
            }
        }
    }

    pub async fn snapshot(&self, symbol: &str, depth: usize) -> Result<DepthSnapshot, EngineError> {
        let handle = self
            .symbols
            .get(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        let (tx, rx) = oneshot::channel();
        handle
            .sender
            .send(ActorCommand::Snapshot { depth, reply: tx })
            .await
            .map_err(|_| EngineError::ActorGone(symbol.to_string()))?;
        rx.await.map_err(|_| EngineError::ActorGone(symbol.to_string()))
    }

    pub async fn bbo(&self, symbol: &str) -> Result<Bbo, EngineError> {
        let handle = self
            .symbols
            .get(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        let (tx, rx) = oneshot::channel();
        handle
            .sender
            .send(ActorCommand::Bbo { reply: tx })
            .await
            .map_err(|_| EngineError::ActorGone(symbol.to_string()))?;
        rx.await.map_err(|_| EngineError::ActorGone(symbol.to_string()))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_usd() -> SymbolConfig {
        SymbolConfig {
            symbol: "BTC-USD".to_string(),
            tick_size: dec!(0.01),
            lot_size: dec!(0.0001),
        }
    }

    fn engine() -> Engine {
        Engine::new(vec![btc_usd()], 256)
    }

    fn limit(symbol: &str, side: Side, price: Decimal, qty: Decimal) -> SubmitRequest {
        SubmitRequest {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            quantity: qty,
            price: Some(price),
        }
    }

    #[tokio::test]
    async fn resting_limit_order_rests_with_no_trades() {
        let engine = engine();
        let resp = engine
            .submit(limit("BTC-USD", Side::Buy, dec!(100.00), dec!(1.0)))
            .await
            .unwrap();
        assert_eq!(resp.status, OrderStatus::Resting);
        assert!(resp.trades.is_empty());
    }

    #[tokio::test]
    async fn unknown_symbol_is_rejected_without_dispatch() {
        let engine = engine();
        let resp = engine
            .submit(limit("ETH-USD", Side::Buy, dec!(100.00), dec!(1.0)))
            .await
            .unwrap();
        assert_eq!(resp.status, OrderStatus::Rejected);
        assert_eq!(resp.reason, Some(RejectReason::UnknownSymbol));
    }

    #[tokio::test]
    async fn price_off_tick_is_rejected() {
        let engine = engine();
        let resp = engine
            .submit(limit("BTC-USD", Side::Buy, dec!(100.005), dec!(1.0)))
            .await
            .unwrap();
        assert_eq!(resp.reason, Some(RejectReason::PriceOffTick));
    }

    #[tokio::test]
    async fn market_order_with_price_is_rejected() {
        let engine = engine();
        let resp = engine
            .submit(SubmitRequest {
                symbol: "BTC-USD".to_string(),
                side: Side::Buy,
                order_type: OrderType::Market,
                quantity: dec!(1.0),
                price: Some(dec!(100.00)),
            })
            .await
            .unwrap();
        assert_eq!(resp.reason, Some(RejectReason::UnexpectedPriceForMarket));
    }

    #[tokio::test]
    async fn crossing_limit_orders_produce_a_trade_and_publish_it() {
        let engine = engine();
        let mut rx = engine.subscribe();
        engine
            .submit(limit("BTC-USD", Side::Sell, dec!(100.00), dec!(1.0)))
            .await
            .unwrap();
        let taker = engine
            .submit(limit("BTC-USD", Side::Buy, dec!(101.00), dec!(1.0)))
            .await
            .unwrap();
        assert_eq!(taker.status, OrderStatus::Filled);
        assert_eq!(taker.trades.len(), 1);
        assert_eq!(taker.trades[0].price, dec!(100.00));

        let mut saw_trade = false;
        while let Ok(evt) = rx.try_recv() {
            if matches!(evt, EngineEvent::Trade(_)) {
                saw_trade = true;
            }
        }
        assert!(saw_trade);
    }

    #[tokio::test]
    async fn fok_unfillable_is_reported_as_rejected_without_mutating_book() {
        let engine = engine();
        engine
            .submit(limit("BTC-USD", Side::Sell, dec!(100.00), dec!(1.0)))
            .await
            .unwrap();
        let resp = engine
            .submit(SubmitRequest {
                symbol: "BTC-USD".to_string(),
                side: Side::Buy,
                order_type: OrderType::Fok,
                quantity: dec!(2.0),
                price: Some(dec!(100.00)),
            })
            .await
            .unwrap();
        assert_eq!(resp.status, OrderStatus::Rejected);
        assert_eq!(resp.reason, Some(RejectReason::FokUnfillable));

        let book = engine.snapshot("BTC-USD", 10).await.unwrap();
        assert_eq!(book.asks, vec![(10000, 10000)]);
    }

    #[tokio::test]
    async fn stats_count_accepted_rejected_and_trades() {
        let engine = engine();
        engine
            .submit(limit("BTC-USD", Side::Sell, dec!(100.00), dec!(1.0)))
            .await
            .unwrap();
        engine
            .submit(limit("BTC-USD", Side::Buy, dec!(100.00), dec!(1.0)))
            .await
            .unwrap();
        engine
            .submit(limit("ETH-USD", Side::Buy, dec!(1.0), dec!(1.0)))
            .await
            .unwrap();

        let stats = engine.stats();
        assert_eq!(stats.total_orders_accepted, 2);
        assert_eq!(stats.total_orders_rejected, 1);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(
            stats.total_matched_volume_per_symbol.get("BTC-USD"),
            Some(&dec!(1.0000))
        );
    }
}
