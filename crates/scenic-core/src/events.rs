//! Broadcast channel for task lifecycle events.
//!
//! Subscribers only see events sent after they subscribed. A subscriber that
//! falls behind by more than the channel capacity loses the oldest events and
//! gets `RecvError::Lagged` once.

use tokio::sync::broadcast;

use crate::domain::TaskEvent;

#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: broadcast::Sender<TaskEvent>,
}

impl EventChannel {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    /// Send to every current subscriber. Without subscribers the event is dropped.
    pub fn publish(&self, event: TaskEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
