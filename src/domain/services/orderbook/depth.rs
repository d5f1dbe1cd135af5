//! Read-only views over an [`OrderBook`](super::orderbook::OrderBook): top-N
//! levels per side and the best-bid/best-offer pair. Both carry prices and
//! volumes in the symbol's internal scale (ticks/lots); the API layer
//! converts to `Decimal` at the boundary using the symbol's `SymbolConfig`.

use chrono::{DateTime, Utc};

use crate::domain::models::types::Sequence;

/// Top-of-book levels for one side, best price first, as (price, volume).
pub type Levels = Vec<(i64, u64)>;

/// A depth-N snapshot of both sides, tagged with the engine sequence at
/// which it was produced so subscribers can detect gaps (SPEC_FULL §6).
#[derive(Debug, Clone)]
pub struct DepthSnapshot {
    pub symbol: String,
    pub bids: Levels,
    pub asks: Levels,
    pub sequence: Sequence,
    pub timestamp: DateTime<Utc>,
}

/// Best bid and best offer, each with its aggregate volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bbo {
    pub bid: Option<(i64, u64)>,
    pub ask: Option<(i64, u64)>,
}
