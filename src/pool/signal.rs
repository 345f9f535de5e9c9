//! # Sync triggers.
//!
//! A [`SyncSignal`] is a single-slot notification queue: at most one sync is ever
//! owed. [`SyncTrigger::notify`] while the pool is idle starts a cycle right away;
//! any number of notifies during a cycle collapse into one follow-up cycle.
//!
//! ```text
//! notify ──► [slot: 0|1] ──► loop wakes ──► drain ──► sync_once
//!   notify (slot full) ──► coalesced, returns false
//! ```
//!
//! Without an external signal the pool falls back to a periodic timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Creates a connected trigger/signal pair.
///
/// Hand the [`SyncSignal`] to [`Options::with_sync_signal`](crate::Options::with_sync_signal)
/// and keep the [`SyncTrigger`] (cloneable) wherever configuration changes are made.
pub fn sync_signal() -> (SyncTrigger, SyncSignal) {
    let (tx, rx) = mpsc::channel(1);
    (SyncTrigger { tx }, SyncSignal { rx })
}

/// Sending half: requests a reconciliation pass.
#[derive(Clone, Debug)]
pub struct SyncTrigger {
    tx: mpsc::Sender<()>,
}

impl SyncTrigger {
    /// Requests a sync without waiting.
    ///
    /// Returns `true` if this call queued a pass, `false` if a pass was already
    /// pending (coalesced) or the pool is gone.
    pub fn notify(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    /// True once the receiving pool has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, consumed by the pool.
#[derive(Debug)]
pub struct SyncSignal {
    rx: mpsc::Receiver<()>,
}

/// What the sync loop waits on.
pub(crate) enum SignalSource {
    Channel(SyncSignal),
    Ticker(Interval),
}

impl SignalSource {
    /// Periodic timer; the first tick fires one `period` from now because the
    /// bootstrap pass already ran.
    pub(crate) fn ticker(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        SignalSource::Ticker(interval)
    }

    /// Waits for the next trigger. Returns `false` once no trigger can ever arrive.
    pub(crate) async fn wait(&mut self) -> bool {
        match self {
            SignalSource::Channel(signal) => {
                if signal.rx.recv().await.is_none() {
                    return false;
                }
                // drain-on-wake: whatever is queued now is covered by this pass
                while signal.rx.try_recv().is_ok() {}
                true
            }
            SignalSource::Ticker(interval) => {
                interval.tick().await;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifies_coalesce_into_one_pending_pass() {
        let (trigger, signal) = sync_signal();
        let mut source = SignalSource::Channel(signal);

        assert!(trigger.notify());
        assert!(!trigger.notify());
        assert!(!trigger.notify());

        assert!(source.wait().await);

        // nothing left owed
        let pending = tokio::time::timeout(Duration::from_millis(50), source.wait()).await;
        assert!(pending.is_err());

        assert!(trigger.notify());
        assert!(source.wait().await);
    }

    #[tokio::test]
    async fn dropped_trigger_ends_the_source() {
        let (trigger, signal) = sync_signal();
        let mut source = SignalSource::Channel(signal);
        drop(trigger);
        assert!(!source.wait().await);
    }

    #[tokio::test]
    async fn trigger_reports_closed_pool() {
        let (trigger, signal) = sync_signal();
        assert!(!trigger.is_closed());
        drop(signal);
        assert!(trigger.is_closed());
        assert!(!trigger.notify());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_skips_the_immediate_tick() {
        let mut source = SignalSource::ticker(Duration::from_secs(30));
        let early = tokio::time::timeout(Duration::from_secs(29), source.wait()).await;
        assert!(early.is_err());
        assert!(source.wait().await);
    }
}
