//! # Non-blocking event fan-out to multiple subscribers.
//!
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - `emit()` returns immediately (`try_send`).
//! - Per-subscriber FIFO; no ordering across subscribers.
//! - On overflow the event is dropped for that subscriber only and
//!   `SubscriberOverflow` is published.
//! - Panics are caught per event; the worker keeps going and publishes
//!   `SubscriberPanicked`.
//! - Trouble while handling a subscriber event (overflow or panic) is only
//!   logged. Publishing it would feed the same subscribers again.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator with one bounded queue and one worker per subscriber.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(payload.as_ref());
                        tracing::warn!(subscriber = sub.name(), %info, "subscriber panicked");
                        if !ev.is_subscriber_event() {
                            worker_bus.publish(Event::subscriber_panicked(sub.name(), info));
                        }
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers without waiting for them.
    pub fn emit(&self, event: &Event) {
        let event = Arc::new(event.clone());
        let is_subscriber_evt = event.is_subscriber_event();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(subscriber = channel.name, reason, "subscriber dropped event");
            if !is_subscriber_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::broadcast::error::TryRecvError;

    use crate::events::EventKind;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber blew up");
        }

        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_affect_others() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let collect = Arc::new(Collect::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![
            collect.clone() as Arc<dyn Subscribe>,
            Arc::new(Explode) as Arc<dyn Subscribe>,
        ];
        let set = SubscriberSet::new(subs, bus.clone());
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::SyncStarted));
        set.emit(&Event::new(EventKind::SyncCompleted));

        let panicked = rx.recv().await.expect("panic event");
        assert_eq!(panicked.kind, EventKind::SubscriberPanicked);
        assert_eq!(panicked.key.as_deref(), Some("explode"));
        assert_eq!(panicked.reason.as_deref(), Some("subscriber blew up"));

        set.shutdown().await;
        assert_eq!(
            *collect.seen.lock(),
            vec![EventKind::SyncStarted, EventKind::SyncCompleted]
        );
    }

    #[tokio::test]
    async fn panic_on_subscriber_event_is_not_republished() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explode) as Arc<dyn Subscribe>], bus.clone());

        set.emit(&Event::subscriber_panicked("other", "earlier panic".to_string()));
        set.emit(&Event::subscriber_overflow("other", "full"));
        set.emit(&Event::new(EventKind::SyncStarted));
        set.shutdown().await;

        let only = rx.try_recv().expect("one panic event");
        assert_eq!(only.kind, EventKind::SubscriberPanicked);
        assert_eq!(only.key.as_deref(), Some("explode"));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
