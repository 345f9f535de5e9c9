//! # Event subscribers for the sync pool.
//!
//! A [`Subscribe`] implementation observes every [`Event`](crate::Event) the pool
//! publishes: cycle reports, handler starts and failures, stop acknowledgements.
//! This is where per-target failures surface; they are never returned to whoever
//! triggered the sync.
//!
//! ```text
//! SyncPool ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                       ├──► LogWriter
//!                                                       ├──► metrics
//!                                                       └──► custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use retrypool::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::HandlerFailed {
//!             // increment failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "failure-counter"
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
