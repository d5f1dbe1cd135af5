//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Event fan-out for the matching engine, built directly on tokio's
// broadcast channel: a single bus carries every symbol's trades and book
// updates, and a lagging subscriber's RecvError::Lagged(n) doubles as the
// dropped-event counter (SPEC_FULL §4.5) -- no separate dispatch/handler
// layer is needed.
//
// | Component   | Description                                          |
// |-------------|-------------------------------------------------------|
// | EngineEvent | Tagged trade/book event carrying its symbol            |
// | EventBus    | Central hub for publishing and subscribing to events   |
//--------------------------------------------------------------------------------------------------

mod event_bus;
mod event_types;

pub use event_bus::EventBus;
pub use event_types::EngineEvent;
