//! # LogWriter: renders pool events through `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG retrypool: sync completed cycle=4 added=2 removed=1 failed=0
//!  INFO retrypool: handler started key="ns-0/broker-1/new" cycle=4
//!  WARN retrypool: handler failed key="ns-1/broker-0/new" cycle=4 reason="build failed: ..."
//!  INFO retrypool: handler stopped key="ns-0/broker-1/old"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::SyncStarted => {
                tracing::trace!(target: "retrypool", cycle = ?e.cycle, "sync started");
            }
            EventKind::SyncCompleted => {
                let r = e.report.unwrap_or_default();
                tracing::debug!(
                    target: "retrypool",
                    cycle = ?e.cycle,
                    added = r.added,
                    removed = r.removed,
                    failed = r.failed,
                    "sync completed"
                );
            }
            EventKind::HandlerStarted => {
                tracing::info!(target: "retrypool", key, cycle = ?e.cycle, "handler started");
            }
            EventKind::HandlerFailed => {
                tracing::warn!(
                    target: "retrypool",
                    key,
                    cycle = ?e.cycle,
                    reason,
                    "handler failed"
                );
            }
            EventKind::HandlerStopped => {
                tracing::info!(target: "retrypool", key, "handler stopped");
            }
            EventKind::HandlerStopFailed => {
                tracing::warn!(target: "retrypool", key, reason, "handler stop failed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "retrypool", "shutdown requested");
            }
            EventKind::PoolStopped => {
                let stopped = e.report.map(|r| r.removed).unwrap_or(0);
                tracing::info!(target: "retrypool", stopped, "pool stopped");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    target: "retrypool",
                    subscriber = key,
                    reason,
                    "subscriber overflow"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(
                    target: "retrypool",
                    subscriber = key,
                    reason,
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SyncReport;

    #[tokio::test]
    async fn renders_every_kind() {
        let w = LogWriter::new();
        for kind in [
            EventKind::SyncStarted,
            EventKind::SyncCompleted,
            EventKind::HandlerStarted,
            EventKind::HandlerFailed,
            EventKind::HandlerStopped,
            EventKind::HandlerStopFailed,
            EventKind::ShutdownRequested,
            EventKind::PoolStopped,
            EventKind::SubscriberOverflow,
            EventKind::SubscriberPanicked,
        ] {
            w.on_event(&Event::new(kind)).await;
        }
        w.on_event(
            &Event::new(EventKind::SyncCompleted)
                .with_cycle(2)
                .with_report(SyncReport {
                    added: 1,
                    ..SyncReport::default()
                }),
        )
        .await;
        assert_eq!(w.name(), "LogWriter");
    }
}
