//! # Handler and factory contracts.
//!
//! A [`Handler`] owns its own execution. The pool only ever calls
//! [`start`](Handler::start) once, right after building it, and
//! [`stop`](Handler::stop) once, after removing it from the pool.
//!
//! ```text
//! SyncPool ── build(target, settings) ──► HandlerFactory
//!    │                                        │
//!    │◄──────────── Arc<dyn Handler> ─────────┘
//!    ├─► start(child_token)     returns once work is spawned
//!    └─► stop()                 on a detached task, never awaited by the loop
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::Target;
use crate::error::HandlerError;

/// Shared handle to a running handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # Long-running worker for one target.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use retrypool::{Handler, HandlerError};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Handler for Noop {
///     async fn start(&self, token: CancellationToken) -> Result<(), HandlerError> {
///         tokio::spawn(async move { token.cancelled().await });
///         Ok(())
///     }
///
///     async fn stop(&self) -> Result<(), HandlerError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Begins work in the background and returns without waiting for it.
    ///
    /// `token` is a child of the pool token; it is cancelled when the handler is
    /// removed or the pool shuts down.
    async fn start(&self, token: CancellationToken) -> Result<(), HandlerError>;

    /// Requests the work to stop. Must be idempotent.
    async fn stop(&self) -> Result<(), HandlerError>;
}

/// Pool-wide values handed to every [`HandlerFactory::build`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Project the handler's queues live in.
    pub project_id: Arc<str>,
    /// Max events a handler processes concurrently.
    pub concurrency: usize,
    /// Upper bound for one delivery attempt.
    pub delivery_timeout: Duration,
}

/// Builds a [`Handler`] for a target.
#[async_trait]
pub trait HandlerFactory: Send + Sync + 'static {
    async fn build(
        &self,
        target: &Arc<Target>,
        settings: &HandlerSettings,
    ) -> Result<HandlerRef, HandlerError>;
}
