//! # Event bus for broadcasting pool events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so the sync loop and the detached
//! stop tasks can publish without ever waiting on a consumer.
//!
//! ```text
//! Publishers:                        Consumer:
//!   sync loop   ──┐
//!   stop task 1 ──┼──► Bus ──► subscriber listener ──► SubscriberSet
//!   stop task N ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks; with no receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - A receiver that falls behind gets `RecvError::Lagged(n)` and skips `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for pool events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::SyncStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::PoolStopped).with_key("ns/b/t"));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::PoolStopped);
        assert_eq!(ev.key.as_deref(), Some("ns/b/t"));
    }
}
