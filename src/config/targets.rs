use std::sync::Arc;

use super::types::{Broker, Queue, Target};

/// Read surface of the target configuration.
///
/// This is everything [`SyncPool`](crate::SyncPool) needs from a store.
/// Implementations must present each call with a consistent view: an edit made
/// through [`TargetsMut::mutate_broker`] is either fully visible or not at all.
pub trait Targets: Send + Sync + 'static {
    /// Calls `visit` once per target across all brokers until it returns `false`.
    ///
    /// Order is unspecified.
    fn range_all_targets(&self, visit: &mut dyn FnMut(&Arc<Target>) -> bool);

    /// Calls `visit` once per broker until it returns `false`.
    fn range_brokers(&self, visit: &mut dyn FnMut(&Arc<Broker>) -> bool);

    /// Looks up a target by its [`Target::key`].
    fn get_target_by_key(&self, key: &str) -> Option<Arc<Target>>;

    /// Looks up a broker by namespace and name.
    fn get_broker(&self, namespace: &str, name: &str) -> Option<Arc<Broker>>;
}

/// Mutation surface of the target configuration.
pub trait TargetsMut: Targets {
    /// Applies a batch of edits to one broker atomically.
    ///
    /// The broker is created if it doesn't exist yet.
    fn mutate_broker(
        &self,
        namespace: &str,
        name: &str,
        edit: &mut dyn FnMut(&mut BrokerMutation),
    );
}

/// Pending edits to a single broker, applied when the mutation closure returns.
pub struct BrokerMutation {
    broker: Broker,
    deleted: bool,
}

impl BrokerMutation {
    pub(crate) fn new(broker: Broker) -> Self {
        Self {
            broker,
            deleted: false,
        }
    }

    /// Consumes the mutation; `None` means the broker was deleted.
    pub(crate) fn finish(self) -> Option<Broker> {
        if self.deleted { None } else { Some(self.broker) }
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.broker.id = id.into();
        self
    }

    pub fn set_address(&mut self, address: impl Into<String>) -> &mut Self {
        self.broker.address = address.into();
        self
    }

    pub fn set_decouple_queue(&mut self, queue: Option<Queue>) -> &mut Self {
        self.broker.decouple_queue = queue;
        self
    }

    /// Inserts targets, replacing any target with the same name.
    ///
    /// Namespace and broker of each target are overwritten with the owning
    /// broker's so that keys stay unique across the store.
    pub fn upsert_targets(&mut self, targets: impl IntoIterator<Item = Target>) -> &mut Self {
        for mut t in targets {
            t.namespace.clone_from(&self.broker.namespace);
            t.broker.clone_from(&self.broker.name);
            self.broker.targets.insert(t.name.clone(), Arc::new(t));
        }
        self
    }

    /// Removes targets by name; unknown names are ignored.
    pub fn delete_targets<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.broker.targets.remove(name.as_ref());
        }
        self
    }

    /// Deletes the whole broker with all its targets.
    ///
    /// Takes precedence over every other edit in the same batch.
    pub fn delete(&mut self) {
        self.deleted = true;
    }
}
