//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                | Description                                          | Key Methods  |
// |---------------------|------------------------------------------------------|--------------|
// | OrderRequest        | Wire shape of the order submission contract (§6)      | try_into_*   |
// | OrderResponseDto    | Wire shape of the submission response                 | from         |
// | TradeDto            | A single trade as reported to the submitter/feed      | from         |
// | BookResponse        | Wire shape of the book query contract                 | from         |
// | StatsResponse       | Wire shape of the stats contract                      | from         |
//--------------------------------------------------------------------------------------------------
//
// Price and quantity are carried as decimal strings on the wire, not as
// JSON numbers: `rust_decimal::Decimal`'s default serde impl round-trips
// through a JSON number, which silently loses precision through any
// intermediate float-typed consumer. Round-tripping through `&str` keeps
// the contract's "exact decimal" promise (SPEC_FULL §3) visible at the JSON
// boundary too.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::types::{OrderStatus, OrderType, Side, SymbolConfig, Trade};
use crate::domain::services::engine::{RejectReason, StatsSnapshot, SubmitRequest, SubmitResponse, TradeReport};
use crate::domain::services::orderbook::DepthSnapshot;

use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: Side,
    pub quantity: String,
    pub price: Option<String>,
}

impl OrderRequest {
    pub fn try_into_submit_request(self) -> Result<SubmitRequest, ApiError> {
        let quantity: Decimal = self
            .quantity
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid quantity: {}", self.quantity)))?;
        let price = self
            .price
            .map(|p| {
                p.parse::<Decimal>()
                    .map_err(|_| ApiError::BadRequest(format!("invalid price: {p}")))
            })
            .transpose()?;
        Ok(SubmitRequest {
            symbol: self.symbol,
            side: self.side,
            order_type: self.order_type,
            quantity,
            price,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeDto {
    pub trade_id: u64,
    pub price: String,
    pub quantity: String,
    pub aggressor_side: Side,
    pub maker_order_id: Uuid,
    pub taker_order_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl From<&TradeReport> for TradeDto {
    fn from(t: &TradeReport) -> Self {
        Self {
            trade_id: t.trade_id,
            price: t.price.to_string(),
            quantity: t.quantity.to_string(),
            aggressor_side: t.aggressor_side,
            maker_order_id: t.maker_order_id,
            taker_order_id: t.taker_order_id,
            timestamp: t.timestamp,
        }
    }
}

impl TradeDto {
    /// Builds a DTO from an internal, tick/lot-scaled `Trade` (as published
    /// on the event bus) plus the symbol's config, for the WebSocket feed.
    pub fn from_trade(t: &Trade, config: &SymbolConfig) -> Self {
        Self {
            trade_id: t.trade_id,
            price: config.ticks_to_price(t.price).to_string(),
            quantity: config.lots_to_qty(t.quantity).to_string(),
            aggressor_side: t.aggressor_side,
            maker_order_id: t.maker_order_id,
            taker_order_id: t.taker_order_id,
            timestamp: t.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDto {
    Filled,
    PartiallyFilledResting,
    PartiallyFilledCancelled,
    Resting,
    Rejected,
}

impl From<OrderStatus> for StatusDto {
    fn from(s: OrderStatus) -> Self {
        match s {
            OrderStatus::Filled => StatusDto::Filled,
            OrderStatus::PartiallyFilledResting => StatusDto::PartiallyFilledResting,
            OrderStatus::PartiallyFilledCancelled => StatusDto::PartiallyFilledCancelled,
            OrderStatus::Resting => StatusDto::Resting,
            OrderStatus::Rejected => StatusDto::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponseDto {
    pub status: StatusDto,
    pub order_id: Uuid,
    pub sequence: u64,
    pub trades: Vec<TradeDto>,
    pub remaining_quantity: String,
    pub reason: Option<RejectReason>,
}

impl From<SubmitResponse> for OrderResponseDto {
    fn from(r: SubmitResponse) -> Self {
        Self {
            status: r.status.into(),
            order_id: r.order_id,
            sequence: r.sequence,
            trades: r.trades.iter().map(TradeDto::from).collect(),
            remaining_quantity: r.remaining_quantity.to_string(),
            reason: r.reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    pub symbol: String,
    pub bids: Vec<(String, String)>,
    pub asks: Vec<(String, String)>,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

impl BookResponse {
    pub fn from_snapshot(snapshot: DepthSnapshot, config: &crate::domain::models::types::SymbolConfig) -> Self {
        let render = |levels: Vec<(i64, u64)>| -> Vec<(String, String)> {
            levels
                .into_iter()
                .map(|(price, qty)| (config.ticks_to_price(price).to_string(), config.lots_to_qty(qty).to_string()))
                .collect()
        };
        Self {
            symbol: snapshot.symbol,
            bids: render(snapshot.bids),
            asks: render(snapshot.asks),
            sequence: snapshot.sequence,
            timestamp: snapshot.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_orders_accepted: u64,
    pub total_orders_rejected: u64,
    pub total_trades: u64,
    pub total_matched_volume_per_symbol: std::collections::HashMap<String, String>,
    pub uptime_seconds: f64,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            total_orders_accepted: s.total_orders_accepted,
            total_orders_rejected: s.total_orders_rejected,
            total_trades: s.total_trades,
            total_matched_volume_per_symbol: s
                .total_matched_volume_per_symbol
                .into_iter()
                .map(|(symbol, volume)| (symbol, volume.to_string()))
                .collect(),
            uptime_seconds: duration_to_secs(s.uptime),
        }
    }
}

fn duration_to_secs(d: Duration) -> f64 {
    d.as_secs_f64()
}
