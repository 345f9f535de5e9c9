//! # Sync pool options.
//!
//! [`Options`] centralizes everything [`start_sync_pool`](crate::start_sync_pool)
//! needs besides the token and the store. Build it with `with_*` calls:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use retrypool::{FnFactory, HandlerError, HandlerSettings, Options, Target, sync_signal};
//!
//! let (trigger, signal) = sync_signal();
//! let opts = Options::default()
//!     .with_project_id("my-project")
//!     .with_sync_signal(signal)
//!     .with_handler_concurrency(16)
//!     .with_handler_factory(FnFactory::arc(
//!         |_t: Arc<Target>, _s: HandlerSettings, token: CancellationToken| async move {
//!             token.cancelled().await;
//!             Ok::<_, HandlerError>(())
//!         },
//!     ));
//! assert!(opts.validate().is_ok());
//! # drop(trigger);
//! ```
//!
//! ## Sentinel values
//! - no `sync_signal` → periodic timer every `sync_interval`
//! - `sync_interval = 0s` is only valid together with a `sync_signal`

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::PoolError;
use crate::handlers::{HandlerFactory, HandlerSettings};
use crate::pool::signal::SyncSignal;
use crate::subscribers::Subscribe;

/// Configuration of a [`SyncPool`](crate::SyncPool).
///
/// ## Field semantics
/// - `project_id`: project tag forwarded to every handler build (required)
/// - `sync_interval`: period of the fallback timer when no signal is given
/// - `handler_concurrency`: per-handler concurrency forwarded to handlers (min 1)
/// - `delivery_timeout`: per-delivery bound forwarded to handlers
/// - `bus_capacity`: event bus ring buffer size (clamped to min 1)
pub struct Options {
    pub project_id: String,
    pub sync_interval: Duration,
    pub handler_concurrency: usize,
    pub delivery_timeout: Duration,
    pub bus_capacity: usize,
    pub(crate) sync_signal: Option<SyncSignal>,
    pub(crate) handler_factory: Option<Arc<dyn HandlerFactory>>,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Default for Options {
    /// Default options:
    ///
    /// - `project_id = ""` (must be set)
    /// - `sync_interval = 60s`
    /// - `handler_concurrency = 100`
    /// - `delivery_timeout = 10min`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            project_id: String::new(),
            sync_interval: Duration::from_secs(60),
            handler_concurrency: 100,
            delivery_timeout: Duration::from_secs(600),
            bus_capacity: 1024,
            sync_signal: None,
            handler_factory: None,
            subscribers: Vec::new(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("project_id", &self.project_id)
            .field("sync_interval", &self.sync_interval)
            .field("handler_concurrency", &self.handler_concurrency)
            .field("delivery_timeout", &self.delivery_timeout)
            .field("bus_capacity", &self.bus_capacity)
            .field("sync_signal", &self.sync_signal.is_some())
            .field("handler_factory", &self.handler_factory.is_some())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Options {
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    /// Uses an external trigger instead of the periodic timer.
    #[must_use]
    pub fn with_sync_signal(mut self, signal: SyncSignal) -> Self {
        self.sync_signal = Some(signal);
        self
    }

    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    #[must_use]
    pub fn with_handler_factory(mut self, factory: Arc<dyn HandlerFactory>) -> Self {
        self.handler_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn with_handler_concurrency(mut self, n: usize) -> Self {
        self.handler_concurrency = n;
        self
    }

    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Sets event subscribers. They receive cycle reports and handler lifecycle
    /// events through dedicated workers with bounded queues.
    #[must_use]
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Checks that these options can drive a pool.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.project_id.trim().is_empty() {
            return Err(PoolError::invalid("project id must not be empty"));
        }
        if self.handler_factory.is_none() {
            return Err(PoolError::invalid("handler factory is required"));
        }
        if self.handler_concurrency == 0 {
            return Err(PoolError::invalid("handler concurrency must be at least 1"));
        }
        if self.sync_signal.is_none() && self.sync_interval.is_zero() {
            return Err(PoolError::invalid(
                "sync interval must be positive when no sync signal is given",
            ));
        }
        Ok(())
    }

    /// Settings forwarded to every handler build.
    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            project_id: Arc::from(self.project_id.as_str()),
            concurrency: self.handler_concurrency,
            delivery_timeout: self.delivery_timeout,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}
