//! Error types used by the sync pool and its handlers.
//!
//! This module defines two main error enums:
//!
//! - [`PoolError`] fatal errors returned by [`start_sync_pool`](crate::start_sync_pool).
//! - [`HandlerError`] per-target errors raised while building, starting or stopping a handler.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Handler errors never reach whoever triggered a sync; the pool publishes them as
//! events and retries the target on the next cycle.

use std::any::Any;

use thiserror::Error;

/// # Errors produced while constructing a sync pool.
///
/// Construction fails closed: when one of these is returned no loop was spawned
/// and no handler was left running.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The supplied [`Options`](crate::Options) cannot drive a pool.
    #[error("invalid pool options: {reason}")]
    InvalidOptions {
        /// What is wrong with the options.
        reason: String,
    },

    /// The owning token was already cancelled before the first sync could begin.
    #[error("pool context cancelled before bootstrap")]
    Cancelled,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use retrypool::PoolError;
    ///
    /// let err = PoolError::InvalidOptions { reason: "empty project id".into() };
    /// assert_eq!(err.as_label(), "pool_invalid_options");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::InvalidOptions { .. } => "pool_invalid_options",
            PoolError::Cancelled => "pool_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PoolError::InvalidOptions { reason } => format!("invalid options: {reason}"),
            PoolError::Cancelled => "cancelled before bootstrap".to_string(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        PoolError::InvalidOptions {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by a single handler.
///
/// All variants are recoverable from the pool's point of view: a target whose
/// handler failed to build or start stays "wanted" and is retried on the next cycle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The factory could not build a handler for the target.
    #[error("build failed: {error}")]
    Build {
        /// The underlying error message.
        error: String,
    },

    /// The handler was built but refused to start.
    #[error("start failed: {error}")]
    Start {
        /// The underlying error message.
        error: String,
    },

    /// The handler reported an error while stopping.
    #[error("stop failed: {error}")]
    Stop {
        /// The underlying error message.
        error: String,
    },

    /// A factory or handler call panicked; the panic was contained.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// `start` was called on a handler that is already running.
    #[error("handler already started")]
    AlreadyStarted,
}

impl HandlerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use retrypool::HandlerError;
    ///
    /// let err = HandlerError::Start { error: "no subscription".into() };
    /// assert_eq!(err.as_label(), "handler_start_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Build { .. } => "handler_build_failed",
            HandlerError::Start { .. } => "handler_start_failed",
            HandlerError::Stop { .. } => "handler_stop_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::AlreadyStarted => "handler_already_started",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Build { error } => format!("build: {error}"),
            HandlerError::Start { error } => format!("start: {error}"),
            HandlerError::Stop { error } => format!("stop: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::AlreadyStarted => "already started".to_string(),
        }
    }

    /// Converts a caught panic payload into [`HandlerError::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        HandlerError::Panicked {
            info: panic_message(payload.as_ref()),
        }
    }
}

/// Renders a panic payload caught with `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let err = HandlerError::from_panic(Box::new("boom"));
        assert_eq!(
            err,
            HandlerError::Panicked {
                info: "boom".into()
            }
        );

        let err = HandlerError::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(err.as_message(), "panic: kaboom");

        let err = HandlerError::from_panic(Box::new(42u32));
        assert_eq!(err.as_label(), "handler_panicked");
        assert_eq!(err.as_message(), "panic: unknown panic");
    }

    #[test]
    fn pool_error_labels_are_stable() {
        assert_eq!(PoolError::Cancelled.as_label(), "pool_cancelled");
        assert_eq!(
            PoolError::invalid("x").to_string(),
            "invalid pool options: x"
        );
    }
}
