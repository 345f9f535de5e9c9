//! # retrypool
//!
//! **retrypool** is the retry-dispatch control plane of an event broker.
//!
//! A live store describes which targets (subscribers) exist per broker and
//! namespace. A [`SyncPool`] keeps exactly one running [`Handler`] per target:
//! whenever it is signalled it diffs the store against its own handlers, starts
//! the missing ones and stops the stale ones.
//!
//! ## Architecture
//! ```text
//!   config edits                        SyncTrigger::notify()
//!        │                                      │
//!        ▼                                      ▼
//! ┌──────────────────────┐          ┌───────────────────────┐
//! │ MemoryTargets        │          │ SyncSignal (1 slot)   │
//! │ ns → broker → target │          │  or periodic timer    │
//! └──────────┬───────────┘          └───────────┬───────────┘
//!            │ range_all_targets()              │ wake
//!            ▼                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SyncPool (one serialized loop)                                   │
//! │  want = store keys, have = registry keys                          │
//! │  - want − have ─► HandlerFactory::build ─► start ─► insert        │
//! │  - have − want ─► remove ─► stop (detached)                       │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │ publish
//!     │  Handler     │   │  Handler     │   │  Handler     │   │
//!     │ ns-0/b-0/t   │   │ ns-0/b-1/t   │   │ ns-1/b-0/t   │   │
//!     └──────────────┘   └──────────────┘   └──────────────┘   ▼
//!                                                   Bus ──► SubscriberSet
//!                                                           (LogWriter, ...)
//! ```
//!
//! ## Guarantees
//! | Property        | Meaning                                                                 |
//! |-----------------|-------------------------------------------------------------------------|
//! | **Convergence** | after a signal and a cycle, pool keys equal store target keys           |
//! | **No duplicates** | at most one handler per key at any instant                            |
//! | **Idempotence** | a signal with no config change starts and stops nothing                 |
//! | **Isolation**   | a failing target never blocks others in the same cycle                  |
//! | **Self-heal**   | failed targets are retried on every following cycle                     |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber rendering events via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use retrypool::{
//!     FnFactory, HandlerError, HandlerSettings, MemoryTargets, Options, Queue, Target,
//!     TargetsMut, start_sync_pool, sync_signal,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let targets = MemoryTargets::arc();
//!     let (trigger, signal) = sync_signal();
//!
//!     let factory = FnFactory::arc(
//!         |_t: Arc<Target>, _s: HandlerSettings, token: CancellationToken| async move {
//!             token.cancelled().await;
//!             Ok::<_, HandlerError>(())
//!         },
//!     );
//!
//!     let token = CancellationToken::new();
//!     let pool = start_sync_pool(
//!         token.clone(),
//!         targets.clone(),
//!         Options::default()
//!             .with_project_id("my-project")
//!             .with_sync_signal(signal)
//!             .with_handler_factory(factory),
//!     )
//!     .await?;
//!
//!     targets.mutate_broker("default", "broker", &mut |bm| {
//!         bm.upsert_targets([Target::new("", "", "trigger-a")
//!             .with_address("http://consumer.default.svc")
//!             .with_retry_queue(Queue::new("retry-topic", "retry-sub"))]);
//!     });
//!     trigger.notify();
//!
//!     while !pool.contains("default/broker/trigger-a").await {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!
//!     token.cancel();
//!     pool.closed().await;
//!     assert!(pool.is_empty().await);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod handlers;
mod pool;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Broker, BrokerMutation, MemoryTargets, Queue, Target, Targets, TargetsMut};
pub use error::{HandlerError, PoolError};
pub use events::{Bus, Event, EventKind, SyncReport};
pub use handlers::{FnFactory, Handler, HandlerFactory, HandlerFn, HandlerRef, HandlerSettings};
pub use pool::{Options, SyncPool, SyncSignal, SyncTrigger, start_sync_pool, sync_signal};
pub use subscribers::{Subscribe, SubscriberSet};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
