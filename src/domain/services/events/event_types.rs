//--------------------------------------------------------------------------------------------------
// STRUCTS & ENUMS
//--------------------------------------------------------------------------------------------------
// | Name         | Description                                              | Key Methods  |
// |--------------|----------------------------------------------------------|--------------|
// | EngineEvent  | Tagged event published after every submission            | symbol       |
//--------------------------------------------------------------------------------------------------

use crate::domain::models::types::Trade;
use crate::domain::services::orderbook::depth::DepthSnapshot;

/// A single fanned-out engine event: either a trade print or a book update,
/// tagged by symbol so a single broadcast channel can carry every symbol
/// (SPEC_FULL §4.5). Subscribers filter by symbol client-side.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Trade(Trade),
    Book(DepthSnapshot),
}

impl EngineEvent {
    pub fn symbol(&self) -> &str {
        match self {
            EngineEvent::Trade(t) => &t.symbol,
            EngineEvent::Book(b) => &b.symbol,
        }
    }
}
