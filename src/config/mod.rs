//! Broker target configuration: data model and the store interface the pool reads.
//!
//! ## Contents
//! - [`Target`], [`Broker`], [`Queue`] the configuration tree entries
//! - [`Targets`] read surface consumed by [`SyncPool`](crate::SyncPool)
//! - [`TargetsMut`] / [`BrokerMutation`] broker-scoped atomic edits
//! - [`MemoryTargets`] in-memory store with snapshot reads
//!
//! ## Tree shape
//! ```text
//! namespace ──► broker name ──► Broker { address, decouple_queue, targets }
//!                                              └─► target name ──► Target
//! ```
//!
//! The only contract shared between the store and the pool is [`Target::key`].

mod memory;
mod targets;
mod types;

pub use memory::MemoryTargets;
pub use targets::{BrokerMutation, Targets, TargetsMut};
pub use types::{Broker, Queue, Target};
