//! # SyncPool: keeps one handler per configured target.
//!
//! ## Cycle
//! ```text
//! want = { t.key() : t  for t in targets.range_all_targets() }
//! have = registry.key_set()
//!
//! for key in have − want:  registry.take(key) ─► cancel token ─► spawn(stop())
//! for key in want − have:  factory.build(t) ─► start(child token) ─► registry.insert
//!                            └─ error/panic ─► HandlerFailed, key stays out of `have`
//! keys in both:            untouched
//! ```
//!
//! ## Loop
//! ```text
//! start_sync_pool ─► validate ─► bootstrap sync_once ─► spawn run()
//!
//! run():
//!   select (biased) {
//!     token.cancelled()  ─► shutdown()
//!     signal.wait()      ─► sync_once()       (signals during a cycle coalesce)
//!   }
//! shutdown(): drain registry ─► request stop of every handler ─► PoolStopped ─► closed
//! ```
//!
//! ## Rules
//! - Cycles never overlap: only the loop task calls `sync_once` after bootstrap.
//! - A failed target is never reported to the trigger; it is retried next cycle.
//! - Stops are detached: a stuck `stop()` never delays the loop.
//! - Changing a target's payload under the same key keeps its handler; replace
//!   the target under a new name to get a new handler.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::config::{Target, Targets};
use crate::error::{HandlerError, PoolError};
use crate::events::{Bus, Event, EventKind, SyncReport};
use crate::handlers::{HandlerFactory, HandlerRef, HandlerSettings};
use crate::pool::options::Options;
use crate::pool::registry::{Entry, Registry};
use crate::pool::signal::SignalSource;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Starts a sync pool over `targets`.
///
/// Runs one sync before returning, so the pool already matches the store when
/// the caller gets it. Afterwards every signal (or timer tick) runs another sync
/// until `token` is cancelled.
///
/// # Errors
/// - [`PoolError::InvalidOptions`] if `options` fail [`Options::validate`]
/// - [`PoolError::Cancelled`] if `token` is already cancelled
///
/// Per-target failures during the bootstrap sync are not errors; those targets
/// are retried on the next cycle.
pub async fn start_sync_pool(
    token: CancellationToken,
    targets: Arc<dyn Targets>,
    options: Options,
) -> Result<Arc<SyncPool>, PoolError> {
    options.validate()?;
    if token.is_cancelled() {
        return Err(PoolError::Cancelled);
    }

    let settings = options.handler_settings();
    let bus = Bus::new(options.bus_capacity_clamped());
    let source = match options.sync_signal {
        Some(signal) => SignalSource::Channel(signal),
        None => SignalSource::ticker(options.sync_interval),
    };
    let factory = options
        .handler_factory
        .ok_or_else(|| PoolError::invalid("handler factory is required"))?;

    let pool = Arc::new(SyncPool {
        targets,
        factory,
        settings,
        registry: Registry::new(),
        bus,
        token,
        closed: CancellationToken::new(),
        cycles: AtomicU64::new(0),
    });

    pool.spawn_listener(options.subscribers);
    let report = pool.sync_once().await;
    tracing::info!(
        project = %pool.settings.project_id,
        handlers = report.added,
        failed = report.failed,
        "sync pool started"
    );

    tokio::spawn(Arc::clone(&pool).run(source));
    Ok(pool)
}

/// Pool of retry handlers kept in sync with a [`Targets`] store.
///
/// Inspection methods are safe to call at any time; they observe the pool
/// between individual inserts/removals of the running cycle.
pub struct SyncPool {
    targets: Arc<dyn Targets>,
    factory: Arc<dyn HandlerFactory>,
    settings: HandlerSettings,
    registry: Registry,
    bus: Bus,
    token: CancellationToken,
    closed: CancellationToken,
    cycles: AtomicU64,
}

impl SyncPool {
    /// Returns sorted keys of the targets that currently have a handler.
    pub async fn keys(&self) -> Vec<String> {
        self.registry.keys().await
    }

    pub async fn len(&self) -> usize {
        self.registry.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.len().await == 0
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.registry.contains(key).await
    }

    /// Returns the handler registered under `key`.
    pub async fn handler(&self, key: &str) -> Option<HandlerRef> {
        self.registry.get(key).await
    }

    /// Number of completed cycles, bootstrap included.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Settings forwarded to every handler build.
    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Receives pool events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Resolves once the pool has shut down and requested a stop of every handler.
    ///
    /// Handler tokens are cancelled by then; the `stop()` calls themselves run
    /// on detached tasks and may still be in flight.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    async fn run(self: Arc<Self>, mut source: SignalSource) {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                fired = source.wait() => {
                    if !fired {
                        tracing::debug!("sync signal closed; idle until shutdown");
                        self.token.cancelled().await;
                        break;
                    }
                    self.sync_once().await;
                }
            }
        }
        self.shutdown().await;
    }

    /// Runs one reconciliation cycle.
    async fn sync_once(&self) -> SyncReport {
        let cycle = self.cycles.load(Ordering::Acquire) + 1;
        self.bus
            .publish(Event::new(EventKind::SyncStarted).with_cycle(cycle));

        let mut want: HashMap<String, Arc<Target>> = HashMap::new();
        self.targets.range_all_targets(&mut |t| {
            want.insert(t.key(), Arc::clone(t));
            true
        });
        let have = self.registry.key_set().await;

        let mut report = SyncReport::default();

        for key in have.iter().filter(|k| !want.contains_key(k.as_str())) {
            if let Some(entry) = self.registry.take(key).await {
                self.request_stop(key.clone(), entry);
                report.removed += 1;
            }
        }

        for (key, target) in want {
            if have.contains(&key) {
                continue;
            }
            if self.token.is_cancelled() {
                break;
            }
            match self.install(&key, &target).await {
                Ok(()) => {
                    report.added += 1;
                    tracing::info!(%key, cycle, "handler started");
                    self.bus.publish(
                        Event::new(EventKind::HandlerStarted)
                            .with_key(key)
                            .with_cycle(cycle),
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        %key,
                        cycle,
                        error = %e,
                        label = e.as_label(),
                        "handler failed; retrying next sync"
                    );
                    self.bus.publish(
                        Event::new(EventKind::HandlerFailed)
                            .with_key(key)
                            .with_cycle(cycle)
                            .with_reason(e.to_string()),
                    );
                }
            }
        }

        self.cycles.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(
            cycle,
            added = report.added,
            removed = report.removed,
            failed = report.failed,
            "sync completed"
        );
        self.bus.publish(
            Event::new(EventKind::SyncCompleted)
                .with_cycle(cycle)
                .with_report(report),
        );
        report
    }

    /// Builds, starts and registers the handler for one target.
    async fn install(&self, key: &str, target: &Arc<Target>) -> Result<(), HandlerError> {
        let handler = AssertUnwindSafe(self.factory.build(target, &self.settings))
            .catch_unwind()
            .await
            .map_err(HandlerError::from_panic)??;

        let token = self.token.child_token();
        let started = AssertUnwindSafe(handler.start(token.clone()))
            .catch_unwind()
            .await
            .map_err(HandlerError::from_panic)
            .and_then(|r| r);
        if let Err(e) = started {
            token.cancel();
            return Err(e);
        }

        if let Err(entry) = self
            .registry
            .insert(key.to_string(), Entry { handler, token })
            .await
        {
            self.request_stop(key.to_string(), entry);
            return Err(HandlerError::Start {
                error: "key already registered".to_string(),
            });
        }
        Ok(())
    }

    /// Cancels the entry's token and asks its handler to stop on a detached task.
    fn request_stop(&self, key: String, entry: Entry) {
        entry.token.cancel();
        tracing::info!(%key, "handler removed");

        let bus = self.bus.clone();
        tokio::spawn(async move {
            let res = AssertUnwindSafe(entry.handler.stop())
                .catch_unwind()
                .await
                .map_err(HandlerError::from_panic)
                .and_then(|r| r);
            match res {
                Ok(()) => bus.publish(Event::new(EventKind::HandlerStopped).with_key(key)),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "handler stop failed");
                    bus.publish(
                        Event::new(EventKind::HandlerStopFailed)
                            .with_key(key)
                            .with_reason(e.to_string()),
                    );
                }
            }
        });
    }

    async fn shutdown(&self) {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));

        let drained = self.registry.drain().await;
        let stopped = u32::try_from(drained.len()).unwrap_or(u32::MAX);
        for (key, entry) in drained {
            self.request_stop(key, entry);
        }

        tracing::info!(stopped, "sync pool stopped");
        self.bus.publish(Event::new(EventKind::PoolStopped).with_report(SyncReport {
            removed: stopped,
            ..SyncReport::default()
        }));
        self.closed.cancel();
    }

    /// Forwards bus events to the subscribers until the pool is closed.
    fn spawn_listener(&self, subscribers: Vec<Arc<dyn Subscribe>>) {
        if subscribers.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(subscribers, self.bus.clone());
        let closed = self.closed.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = closed.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        });
    }
}
