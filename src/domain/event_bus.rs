//! Fan-out of [`SpinEvent`]s to live observers.
//!
//! Services publish after each committed state change; the `/ws` feed is
//! the only consumer. Publishing never blocks and never fails: with no
//! observer connected the event is discarded.

use tokio::sync::broadcast;

use super::SpinEvent;

/// Ring-buffer size used when `EVENT_BUS_CAPACITY` is not set.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Cloneable handle to a broadcast channel of [`SpinEvent`]s.
///
/// Observers that fall more than `capacity` events behind skip the oldest
/// ones and see `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SpinEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcasts `event` and returns how many observers got it.
    pub fn publish(&self, event: SpinEvent) -> usize {
        let kind = event.event_type_str();
        let campaign_id = event.campaign_id();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event = kind, %campaign_id, delivered, "event published");
        delivered
    }

    /// Opens a new observer that sees every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SpinEvent> {
        self.sender.subscribe()
    }

    /// Number of connected observers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
