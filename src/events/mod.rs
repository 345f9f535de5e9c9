//! Pool events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the sync loop and handler stop tasks.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`SyncReport`] per-cycle counters carried by [`EventKind::SyncCompleted`]
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `SyncPool` loop, detached handler stop tasks,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the pool's subscriber listener, which fans out to the
//!   [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, SyncReport};
