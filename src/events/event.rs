//! # Events emitted by the sync pool.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Cycle events**: one reconciliation pass started/completed
//! - **Handler events**: a handler started, failed, stopped or failed to stop
//! - **Pool events**: shutdown requested, pool stopped, subscriber trouble
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Stop tasks run detached, so `HandlerStopped` may be delivered after the
//! `SyncCompleted` of the cycle that removed the handler; use `seq` to order.
//!
//! ## Example
//! ```rust
//! use retrypool::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HandlerFailed)
//!     .with_key("ns/default/trigger-a")
//!     .with_reason("build failed: no retry queue")
//!     .with_cycle(3);
//!
//! assert_eq!(ev.kind, EventKind::HandlerFailed);
//! assert_eq!(ev.key.as_deref(), Some("ns/default/trigger-a"));
//! assert_eq!(ev.cycle, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Cycle events ===
    /// A reconciliation cycle began.
    ///
    /// Sets: `cycle`
    SyncStarted,

    /// A reconciliation cycle finished.
    ///
    /// Sets: `cycle`, `report`
    SyncCompleted,

    // === Handler events ===
    /// A handler was built, started and inserted into the pool.
    ///
    /// Sets: `key`, `cycle`
    HandlerStarted,

    /// Building or starting a handler failed; the target is retried next cycle.
    ///
    /// Sets: `key`, `cycle`, `reason`
    HandlerFailed,

    /// A removed handler acknowledged its stop request.
    ///
    /// Sets: `key`
    HandlerStopped,

    /// A removed handler returned an error (or panicked) from `stop`.
    /// The entry is gone from the pool regardless.
    ///
    /// Sets: `key`, `reason`
    HandlerStopFailed,

    // === Pool events ===
    /// The owning token was cancelled; no more cycles will run.
    ShutdownRequested,

    /// Every remaining handler was asked to stop and the pool is empty.
    ///
    /// Sets: `report` (`removed` = handlers stopped at shutdown)
    PoolStopped,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `key` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `key` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Counters describing the outcome of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Handlers started and inserted.
    pub added: u32,
    /// Handlers removed and asked to stop.
    pub removed: u32,
    /// Targets whose handler failed to build or start.
    pub failed: u32,
}

impl SyncReport {
    /// True if the cycle changed nothing and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.failed == 0
    }
}

/// Pool event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Target key (or subscriber name for subscriber events).
    pub key: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Cycle number (1 = bootstrap pass).
    pub cycle: Option<u64>,
    /// Cycle counters.
    pub report: Option<SyncReport>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            reason: None,
            cycle: None,
            report: None,
        }
    }

    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    #[inline]
    pub fn with_report(mut self, report: SyncReport) -> Self {
        self.report = Some(report);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::SyncStarted);
        let b = Event::new(EventKind::SyncCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn report_noop() {
        assert!(SyncReport::default().is_noop());
        let r = SyncReport {
            failed: 1,
            ..SyncReport::default()
        };
        assert!(!r.is_noop());
    }

    #[test]
    fn subscriber_events_are_flagged() {
        assert!(Event::subscriber_overflow("audit", "full").is_subscriber_event());
        assert!(!Event::new(EventKind::HandlerStarted).is_subscriber_event());
    }
}
