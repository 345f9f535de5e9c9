//! Handler abstraction: the per-target delivery worker the pool starts and stops.
//!
//! - [`Handler`] start/stop contract; the pool never looks inside
//! - [`HandlerFactory`] builds one handler per target
//! - [`HandlerSettings`] pool-wide values forwarded to every build
//! - [`HandlerFn`] / [`FnFactory`] closure-backed implementations

mod handler;
mod handler_fn;

pub use handler::{Handler, HandlerFactory, HandlerRef, HandlerSettings};
pub use handler_fn::{FnFactory, HandlerFn};
