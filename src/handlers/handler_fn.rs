//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Arc<Target>, HandlerSettings, CancellationToken) -> Fut`.
//! `start` calls the closure once and spawns the returned future; `stop` cancels
//! the token that future was given. Worker errors are logged, never returned to the pool.
//!
//! [`FnFactory`] turns the same closure into a [`HandlerFactory`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use retrypool::{FnFactory, HandlerError, HandlerSettings, Target};
//!
//! let factory = FnFactory::arc(
//!     |target: Arc<Target>, _settings: HandlerSettings, token: CancellationToken| async move {
//!         // pull from target.retry_queue and redeliver to target.address...
//!         let _ = target;
//!         token.cancelled().await;
//!         Ok::<_, HandlerError>(())
//!     },
//! );
//! # let _ = factory;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Target;
use crate::error::HandlerError;
use crate::handlers::handler::{Handler, HandlerFactory, HandlerRef, HandlerSettings};

/// Closure-backed handler for one target.
pub struct HandlerFn<F> {
    target: Arc<Target>,
    settings: HandlerSettings,
    f: Arc<F>,
    running: Mutex<Option<CancellationToken>>,
}

impl<F> HandlerFn<F> {
    pub fn new(target: Arc<Target>, settings: HandlerSettings, f: Arc<F>) -> Self {
        Self {
            target,
            settings,
            f,
            running: Mutex::new(None),
        }
    }

    /// Target this handler serves.
    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    /// True between a successful `start` and the first `stop`.
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Arc<Target>, HandlerSettings, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn start(&self, token: CancellationToken) -> Result<(), HandlerError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(HandlerError::AlreadyStarted);
        }

        let work = (self.f)(
            Arc::clone(&self.target),
            self.settings.clone(),
            token.clone(),
        );
        let key = self.target.key();
        tokio::spawn(async move {
            match work.await {
                Ok(()) => tracing::debug!(%key, "handler work finished"),
                Err(e) => {
                    tracing::warn!(%key, error = %e, label = e.as_label(), "handler work failed");
                }
            }
        });

        *running = Some(token);
        Ok(())
    }

    async fn stop(&self) -> Result<(), HandlerError> {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
        }
        Ok(())
    }
}

/// [`HandlerFactory`] producing a [`HandlerFn`] per target.
///
/// Targets without a retry queue are rejected with [`HandlerError::Build`]: there is
/// nothing for a retry handler to consume.
pub struct FnFactory<F> {
    f: Arc<F>,
}

impl<F> FnFactory<F> {
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> HandlerFactory for FnFactory<F>
where
    F: Fn(Arc<Target>, HandlerSettings, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn build(
        &self,
        target: &Arc<Target>,
        settings: &HandlerSettings,
    ) -> Result<HandlerRef, HandlerError> {
        if target.retry_queue.is_none() {
            return Err(HandlerError::Build {
                error: format!("target {} has no retry queue", target.key()),
            });
        }
        Ok(Arc::new(HandlerFn::new(
            Arc::clone(target),
            settings.clone(),
            Arc::clone(&self.f),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::config::Queue;

    fn settings() -> HandlerSettings {
        HandlerSettings {
            project_id: Arc::from("test-project"),
            concurrency: 1,
            delivery_timeout: Duration::from_secs(1),
        }
    }

    fn target() -> Arc<Target> {
        Arc::new(Target::new("ns", "b", "t").with_retry_queue(Queue::new("topic", "sub")))
    }

    #[tokio::test]
    async fn start_spawns_and_stop_cancels() {
        let exited = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&exited);
        let h = HandlerFn::new(
            target(),
            settings(),
            Arc::new(move |_t: Arc<Target>, _s: HandlerSettings, token: CancellationToken| {
                let counter = Arc::clone(&counter);
                async move {
                    token.cancelled().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), HandlerError>(())
                }
            }),
        );

        h.start(CancellationToken::new()).await.expect("start");
        assert!(h.is_running());
        assert_eq!(
            h.start(CancellationToken::new()).await,
            Err(HandlerError::AlreadyStarted)
        );

        h.stop().await.expect("stop");
        h.stop().await.expect("stop is idempotent");
        assert!(!h.is_running());

        tokio::time::timeout(Duration::from_secs(1), async {
            while exited.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("work observed cancellation");
    }

    #[tokio::test]
    async fn factory_forwards_settings_and_rejects_missing_queue() {
        let factory = FnFactory::new(
            |t: Arc<Target>, s: HandlerSettings, _token: CancellationToken| async move {
                assert_eq!(t.key(), "ns/b/t");
                assert_eq!(&*s.project_id, "test-project");
                Ok::<(), HandlerError>(())
            },
        );

        let built = factory.build(&target(), &settings()).await;
        assert!(built.is_ok());

        let bare = Arc::new(Target::new("ns", "b", "bare"));
        let err = factory
            .build(&bare, &settings())
            .await
            .err()
            .expect("build must fail");
        assert_eq!(err.as_label(), "handler_build_failed");
    }
}
