use thiserror::Error;

pub mod depth;
pub mod orderbook;
pub mod price_level;

pub use depth::{Bbo, DepthSnapshot};
pub use orderbook::OrderBook;
pub use price_level::PriceLevel;

/// Errors that can occur within the orderbook service.
#[derive(Debug, Error)]
pub enum OrderbookError {
    /// A resting order was submitted without a limit price.
    #[error("market orders cannot be added to the orderbook (no limit price)")]
    NoLimitPrice,

    /// An invariant (B1-B3, L1-L3) was found violated.
    #[error("orderbook invariant violated: {0}")]
    InvariantViolation(String),
}
