//! Sync pool: reconciles running handlers against the target store.
//!
//! Internal modules:
//! - `sync`: the reconciliation loop and [`SyncPool`] itself;
//! - `registry`: concurrency-safe `key → handler` map;
//! - `signal`: coalescing sync triggers and the fallback timer;
//! - `options`: construction options and validation.

mod options;
mod registry;
mod signal;
mod sync;

pub use options::Options;
pub use signal::{SyncSignal, SyncTrigger, sync_signal};
pub use sync::{SyncPool, start_sync_pool};
