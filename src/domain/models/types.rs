//! Core order/trade types and the fixed-point price/quantity representation.
//!
//! Prices and quantities are carried internally as scaled integers (ticks and
//! lots) so the matching path never performs decimal or floating-point
//! arithmetic. `Decimal` only appears at the conversion boundary in
//! [`SymbolConfig`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type OrderId = Uuid;
pub type TradeId = u64;
pub type Sequence = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
    Ioc,
    Fok,
}

impl OrderType {
    /// Limit/Ioc/Fok require a price; Market must not carry one.
    pub fn requires_price(self) -> bool {
        !matches!(self, OrderType::Market)
    }
}

/// Outcome reported to the submitter, per the order submission contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Filled,
    PartiallyFilledResting,
    PartiallyFilledCancelled,
    Resting,
    Rejected,
}

/// A single resting or incoming order. `price` is in ticks (symbol-scaled
/// integer), `original_qty`/`remaining_qty` are in lots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<i64>,
    pub original_qty: u64,
    pub remaining_qty: u64,
    pub sequence: Sequence,
    pub arrival_time: DateTime<Utc>,
}

impl Order {
    pub fn is_resting_eligible(&self) -> bool {
        matches!(self.order_type, OrderType::Limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: String,
    pub price: i64,
    pub quantity: u64,
    pub aggressor_side: Side,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub timestamp: DateTime<Utc>,
    pub sequence: Sequence,
}

/// Per-symbol tick/lot table, fixed at startup (SPEC_FULL §3, §9 open question).
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    #[error("value {value} is not a multiple of the symbol's increment {increment}")]
    NotOnIncrement { value: Decimal, increment: Decimal },
    #[error("value {0} does not fit in the internal fixed-point representation")]
    Overflow(Decimal),
    #[error("increment must be positive, got {0}")]
    NonPositiveIncrement(Decimal),
}

impl SymbolConfig {
    /// Converts an exact decimal price into ticks, rejecting values off the
    /// symbol's tick grid.
    pub fn price_to_ticks(&self, price: Decimal) -> Result<i64, ScaleError> {
        to_scaled(price, self.tick_size)
            .and_then(|v| i64::try_from(v).map_err(|_| ScaleError::Overflow(price)))
    }

    pub fn ticks_to_price(&self, ticks: i64) -> Decimal {
        Decimal::from(ticks) * self.tick_size
    }

    /// Converts an exact decimal quantity into lots, rejecting values off the
    /// symbol's lot grid.
    pub fn qty_to_lots(&self, qty: Decimal) -> Result<u64, ScaleError> {
        to_scaled(qty, self.lot_size)
            .and_then(|v| u64::try_from(v).map_err(|_| ScaleError::Overflow(qty)))
    }

    pub fn lots_to_qty(&self, lots: u64) -> Decimal {
        Decimal::from(lots) * self.lot_size
    }
}

fn to_scaled(value: Decimal, increment: Decimal) -> Result<i128, ScaleError> {
    if increment <= Decimal::ZERO {
        return Err(ScaleError::NonPositiveIncrement(increment));
    }
    let ratio = value / increment;
    if ratio.fract() != Decimal::ZERO {
        return Err(ScaleError::NotOnIncrement { value, increment });
    }
    ratio
        .trunc()
        .to_string()
        .parse::<i128>()
        .map_err(|_| ScaleError::Overflow(value))
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
