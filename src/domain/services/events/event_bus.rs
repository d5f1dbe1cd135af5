//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// A thin wrapper over tokio's broadcast channel that fans out every engine
// event to whichever transport-layer subscribers (WebSocket handlers, tests)
// are currently attached. A lagging subscriber's next `recv()` returns
// `RecvError::Lagged(n)` rather than the bus tracking drops itself -- that
// return value *is* the per-subscriber dropped-event count (SPEC_FULL §4.5).
//
// | Component | Description                                                 |
// |-----------|--------------------------------------------------------------|
// | EventBus  | Central event publishing component                          |
//--------------------------------------------------------------------------------------------------

use tokio::sync::broadcast;
use tracing::debug;

use super::event_types::EngineEvent;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publishes an event to all subscribers. A send with no subscribers, or
    /// one that overflows a lagging subscriber's queue, is not an error: the
    /// drop-oldest overflow policy is tokio broadcast's native behavior.
    pub fn publish(&self, event: EngineEvent) {
        debug!(symbol = event.symbol(), "publishing engine event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::types::{now, Side, Trade};
    use uuid::Uuid;

    fn trade() -> Trade {
        Trade {
            trade_id: 1,
            symbol: "BTC-USD".to_string(),
            price: 100,
            quantity: 1,
            aggressor_side: Side::Buy,
            maker_order_id: Uuid::new_v4(),
            taker_order_id: Uuid::new_v4(),
            timestamp: now(),
            sequence: 1,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(EngineEvent::Trade(trade()));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.symbol(), "BTC-USD");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(8);
        bus.publish(EngineEvent::Trade(trade()));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_reports_dropped_count_via_lagged() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(EngineEvent::Trade(trade()));
        }
        match rx.recv().await {
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => assert!(n > 0),
            other => panic!("expected Lagged, got {other:?}"),
        }
    }
}
