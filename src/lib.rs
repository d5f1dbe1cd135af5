//! A limit-order matching engine for a single-venue, crypto-style market:
//! price-time priority, Limit/Market/Ioc/Fok order types, and an in-process
//! trade/book event stream. See [`domain::services::engine`] for the public
//! entry point.

pub mod api;
pub mod config;
pub mod domain;

pub use domain::models::types::{
    now, Order, OrderId, OrderStatus, OrderType, ScaleError, Sequence, Side, SymbolConfig, Trade,
    TradeId,
};
pub use domain::services::engine::{
    Engine, EngineError, RejectReason, StatsSnapshot, SubmitRequest, SubmitResponse, TradeReport,
};
pub use domain::services::events::{EngineEvent, EventBus};
pub use domain::services::matching_engine::{resolve_status, run, MatchOutcome};
pub use domain::services::orderbook::{Bbo, DepthSnapshot, OrderBook, OrderbookError, PriceLevel};
