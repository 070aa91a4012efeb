//! State sink backed by a broadcast channel

use relwatch_api::events::StateEvent;
use tokio::sync::broadcast;
use tracing::debug;

use crate::traits::StateSink;

/// Fans published events out to any number of subscribers
///
/// Events published while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<StateEvent>,
}

impl BroadcastSink {
    /// Create a sink with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Get a receiver for subsequently published events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.tx.subscribe()
    }
}

impl StateSink for BroadcastSink {
    fn publish(&self, event: StateEvent) {
        debug!(key = event.key(), "publishing state event");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}
