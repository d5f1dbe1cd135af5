//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a limit order book for a single trading symbol.
// It maintains bid and ask orders in price-time priority (FIFO) order, keyed
// by price for O(log n) best-price lookup and ordered traversal.
//
// | Component     | Description                                                               |
// |--------------|---------------------------------------------------------------------------|
// | OrderBook    | Bids/asks price->PriceLevel maps plus an order-id index                   |
// | PriceLevel   | Groups orders at the same price level (see price_level.rs)                |
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::models::types::{Order, Sequence, Side};
use crate::domain::services::orderbook::depth::{Bbo, DepthSnapshot};
use crate::domain::services::orderbook::price_level::PriceLevel;
use crate::domain::services::orderbook::OrderbookError;

/// Bids are keyed by price ascending but read from the top (`last`/`next_back`)
/// so the best bid is the maximum key; asks are read from the front so the
/// best ask is the minimum key. Both support O(log n) insert/remove.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub symbol: String,
    bids: BTreeMap<i64, PriceLevel>,
    asks: BTreeMap<i64, PriceLevel>,
    /// order-id -> (side, price) index for O(1) lookup without the level
    /// holding a back-reference to the book (SPEC_FULL §9: no cyclic
    /// ownership between an order and its containing level).
    index: HashMap<Uuid, (Side, i64)>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    fn side_map(&self, side: Side) -> &BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Returns the best price level on `side`: max price for bids, min price
    /// for asks.
    pub fn best(&self, side: Side) -> Option<&PriceLevel> {
        match side {
            Side::Buy => self.bids.values().next_back(),
            Side::Sell => self.asks.values().next(),
        }
    }

    pub fn best_mut(&mut self, side: Side) -> Option<&mut PriceLevel> {
        match side {
            Side::Buy => self.bids.values_mut().next_back(),
            Side::Sell => self.asks.values_mut().next(),
        }
    }

    pub fn best_price(&self, side: Side) -> Option<i64> {
        self.best(side).map(|l| l.price)
    }

    /// Locates or creates the level at `order.price` on `order.side` and
    /// appends the order, maintaining B1 (no empty levels) trivially since
    /// appending never empties a level, and B3 (index agrees with side).
    pub fn insert_resting(&mut self, order: Order) -> Result<(), OrderbookError> {
        let price = order
            .price
            .ok_or_else(|| OrderbookError::NoLimitPrice)?;
        let side = order.side;
        let order_id = order.id;
        let map = self.side_map_mut(side);
        let level = map.entry(price).or_insert_with(|| PriceLevel::new(price));
        level.append(order);
        self.index.insert(order_id, (side, price));
        Ok(())
    }

    /// Drops the level at `price` on `side` from the index if its volume is
    /// zero (B1).
    pub fn remove_if_empty(&mut self, side: Side, price: i64) {
        let map = self.side_map_mut(side);
        if let Some(level) = map.get(&price) {
            if level.is_empty() {
                map.remove(&price);
            }
        }
    }

    /// Removes a single resting order by id, used internally by invariant
    /// checks and tests. Not exposed as an external cancel API (out of scope,
    /// SPEC_FULL §3).
    pub fn remove_order(&mut self, order_id: Uuid) -> Option<Order> {
        let (side, price) = self.index.remove(&order_id)?;
        let map = self.side_map_mut(side);
        let level = map.get_mut(&price)?;
        let removed = level.remove(order_id);
        self.remove_if_empty(side, price);
        removed
    }

    pub fn contains(&self, order_id: Uuid) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Top-N levels per side as (price, aggregate volume), best first.
    pub fn snapshot(&self, depth: usize) -> (Vec<(i64, u64)>, Vec<(i64, u64)>) {
        let bids = self
            .bids
            .values()
            .rev()
            .take(depth)
            .map(|l| (l.price, l.volume()))
            .collect();
        let asks = self
            .asks
            .values()
            .take(depth)
            .map(|l| (l.price, l.volume()))
            .collect();
        (bids, asks)
    }

    /// (best-bid price+volume, best-ask price+volume).
    pub fn bbo(&self) -> (Option<(i64, u64)>, Option<(i64, u64)>) {
        let bid = self.best(Side::Buy).map(|l| (l.price, l.volume()));
        let ask = self.best(Side::Sell).map(|l| (l.price, l.volume()));
        (bid, ask)
    }

    /// Invariant B2: no bid level may sit at or above any ask level.
    pub fn is_crossed(&self) -> bool {
        match (self.best_price(Side::Buy), self.best_price(Side::Sell)) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// The head order of the best level on `side`, without mutating
    /// anything: (order id, level price, order's remaining quantity).
    /// Used by the matching core's opposite-side walk (SPEC_FULL §4.3).
    pub fn best_head(&self, side: Side) -> Option<(Uuid, i64, u64)> {
        let level = self.best(side)?;
        let head = level.head()?;
        Some((head.id, level.price, head.remaining_qty))
    }

    /// Consumes `qty` from the head of the best level on `side`, removing
    /// the order (and the level, if now empty) exactly as `PriceLevel::consume`
    /// would. Keeps the order-id index consistent with the level contents.
    /// Panics if `side` has no best level; callers must check via
    /// `best_head` first, as the matching walk always does.
    pub fn consume_best(&mut self, side: Side, qty: u64) {
        let price = self
            .best_price(side)
            .expect("consume_best called with no resting level on this side");
        let map = self.side_map_mut(side);
        let level = map.get_mut(&price).expect("best_price implies the level exists");
        let maker_id = level.head().expect("level retained only while non-empty (B1)").id;
        level.consume(qty);
        if level.is_empty() {
            map.remove(&price);
            self.index.remove(&maker_id);
        }
    }

    /// Price levels on `side`, best price first.
    pub fn levels_best_first(&self, side: Side) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.values().rev()),
            Side::Sell => Box::new(self.asks.values()),
        }
    }

    pub fn snapshot_dto(&self, depth: usize, sequence: Sequence) -> DepthSnapshot {
        let (bids, asks) = self.snapshot(depth);
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids,
            asks,
            sequence,
            timestamp: Utc::now(),
        }
    }

    pub fn bbo_dto(&self) -> Bbo {
        let (bid, ask) = self.bbo();
        Bbo { bid, ask }
    }

    /// Checks B1-B3 and L1-L3 over the whole book. Cheap enough to run
    /// after every submission; a failure is fatal (SPEC_FULL §7,
    /// InternalInvariantViolation) and the caller must quarantine the
    /// symbol rather than keep matching against a corrupt book.
    pub fn check_invariants(&self) -> Result<(), OrderbookError> {
        if self.is_crossed() {
            return Err(OrderbookError::InvariantViolation(format!(
                "book crossed: best bid {:?} >= best ask {:?}",
                self.best_price(Side::Buy),
                self.best_price(Side::Sell)
            )));
        }
        for (side, map) in [(Side::Buy, &self.bids), (Side::Sell, &self.asks)] {
            for (price, level) in map.iter() {
                if level.is_empty() {
                    return Err(OrderbookError::InvariantViolation(format!(
                        "empty {side:?} level retained at price {price}"
                    )));
                }
                let mut last_seq: Option<u64> = None;
                let mut sum = 0u64;
                for order in level.iter() {
                    if order.remaining_qty == 0 {
                        return Err(OrderbookError::InvariantViolation(format!(
                            "order {} at {side:?}@{price} has zero remaining quantity",
                            order.id
                        )));
                    }
                    if let Some(prev) = last_seq {
                        if order.sequence <= prev {
                            return Err(OrderbookError::InvariantViolation(format!(
                                "FIFO order violated at {side:?}@{price}: sequence {} follows {prev}",
                                order.sequence
                            )));
                        }
                    }
                    last_seq = Some(order.sequence);
                    sum += order.remaining_qty;
                }
                if sum != level.volume() {
                    return Err(OrderbookError::InvariantViolation(format!(
                        "aggregate volume mismatch at {side:?}@{price}: cached {} != summed {sum}",
                        level.volume()
                    )));
                }
            }
        }
        Ok(())
    }
}
