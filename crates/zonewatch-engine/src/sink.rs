//! Process-wide update fan-out.

use tokio::sync::broadcast;
use zonewatch_models::UpdateMessage;

/// Default channel capacity before slow subscribers start losing messages.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast channel carrying typed update messages.
///
/// Delivery is best-effort: publishing never blocks, a send with no
/// subscribers is a no-op, and a lagged subscriber drops the oldest
/// messages rather than back-pressuring producers. Both the scheduler and
/// the occupancy tracker publish through this one-way interface; transport
/// adapters subscribe.
#[derive(Debug, Clone)]
pub struct UpdateSink {
    tx: broadcast::Sender<UpdateMessage>,
}

impl UpdateSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a message to every current subscriber.
    pub fn publish(&self, message: UpdateMessage) {
        // Err means no active subscribers; that is fine.
        let _ = self.tx.send(message);
    }

    /// Attach a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateMessage> {
        self.tx.subscribe()
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for UpdateSink {
    fn default() -> Self {
        Self::new()
    }
}
