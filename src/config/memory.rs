//! # In-memory target store.
//!
//! [`MemoryTargets`] keeps the whole tree behind an [`ArcSwap`]. Readers load the
//! current snapshot without locking; writers are serialized by a mutex, copy the
//! touched broker, apply the batch and swap in a new tree.
//!
//! ```text
//! mutate_broker(ns, name, edit)
//!   ├─► lock writer
//!   ├─► clone snapshot (brokers stay shared behind Arc)
//!   ├─► edit(&mut BrokerMutation) on a private copy of one broker
//!   └─► store(new tree)           ◄── readers see old or new, never half
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::targets::{BrokerMutation, Targets, TargetsMut};
use super::types::{Broker, Target, split_target_key};

type Tree = HashMap<String, HashMap<String, Arc<Broker>>>;

/// Thread-safe in-memory implementation of [`Targets`] and [`TargetsMut`].
pub struct MemoryTargets {
    tree: ArcSwap<Tree>,
    writer: Mutex<()>,
}

impl MemoryTargets {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tree: ArcSwap::from_pointee(Tree::new()),
            writer: Mutex::new(()),
        }
    }

    /// Creates an empty store wrapped in an `Arc`.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the sorted keys of every target in the store.
    pub fn all_target_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.range_all_targets(&mut |t| {
            keys.push(t.key());
            true
        });
        keys.sort_unstable();
        keys
    }
}

impl Default for MemoryTargets {
    fn default() -> Self {
        Self::new()
    }
}

impl Targets for MemoryTargets {
    fn range_all_targets(&self, visit: &mut dyn FnMut(&Arc<Target>) -> bool) {
        let tree = self.tree.load();
        for brokers in tree.values() {
            for broker in brokers.values() {
                for target in broker.targets.values() {
                    if !visit(target) {
                        return;
                    }
                }
            }
        }
    }

    fn range_brokers(&self, visit: &mut dyn FnMut(&Arc<Broker>) -> bool) {
        let tree = self.tree.load();
        for brokers in tree.values() {
            for broker in brokers.values() {
                if !visit(broker) {
                    return;
                }
            }
        }
    }

    fn get_target_by_key(&self, key: &str) -> Option<Arc<Target>> {
        let (ns, broker, name) = split_target_key(key)?;
        self.get_broker(&ns, &broker)?.targets.get(&name).cloned()
    }

    fn get_broker(&self, namespace: &str, name: &str) -> Option<Arc<Broker>> {
        self.tree.load().get(namespace)?.get(name).cloned()
    }
}

impl TargetsMut for MemoryTargets {
    fn mutate_broker(
        &self,
        namespace: &str,
        name: &str,
        edit: &mut dyn FnMut(&mut BrokerMutation),
    ) {
        let _guard = self.writer.lock();
        let current = self.tree.load_full();

        let broker = current
            .get(namespace)
            .and_then(|brokers| brokers.get(name))
            .map(|b| Broker::clone(b))
            .unwrap_or_else(|| Broker::empty(namespace, name));

        let mut mutation = BrokerMutation::new(broker);
        edit(&mut mutation);

        let mut next = Tree::clone(&current);
        match mutation.finish() {
            Some(broker) => {
                next.entry(namespace.to_string())
                    .or_default()
                    .insert(name.to_string(), Arc::new(broker));
            }
            None => {
                if let Some(brokers) = next.get_mut(namespace) {
                    brokers.remove(name);
                    if brokers.is_empty() {
                        next.remove(namespace);
                    }
                }
            }
        }
        self.tree.store(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Queue;

    fn target(name: &str) -> Target {
        Target::new("", "", name)
            .with_address("consumer.example.com")
            .with_retry_queue(Queue::new("topic", "sub"))
    }

    #[test]
    fn empty_store_has_no_targets() {
        let store = MemoryTargets::new();
        assert!(store.all_target_keys().is_empty());
        assert!(store.get_broker("ns", "b").is_none());
        assert!(store.get_target_by_key("ns/b/t").is_none());
        assert!(store.get_target_by_key("garbage").is_none());
    }

    #[test]
    fn mutate_creates_broker_and_stamps_identity() {
        let store = MemoryTargets::new();
        store.mutate_broker("ns", "b", &mut |bm| {
            bm.set_address("broker.example.com")
                .set_decouple_queue(Some(Queue::new("t-0", "sub-0")))
                .upsert_targets([target("t1"), target("t2")]);
        });

        let broker = store.get_broker("ns", "b").expect("broker created");
        assert_eq!(broker.address, "broker.example.com");
        assert_eq!(broker.decouple_queue, Some(Queue::new("t-0", "sub-0")));
        assert_eq!(store.all_target_keys(), vec!["ns/b/t1", "ns/b/t2"]);

        let t = store.get_target_by_key("ns/b/t1").expect("target present");
        assert_eq!(t.namespace, "ns");
        assert_eq!(t.broker, "b");
    }

    #[test]
    fn upsert_replaces_same_name() {
        let store = MemoryTargets::new();
        store.mutate_broker("ns", "b", &mut |bm| {
            bm.upsert_targets([target("t")]);
        });
        store.mutate_broker("ns", "b", &mut |bm| {
            bm.upsert_targets([target("t").with_address("other.example.com")]);
        });

        assert_eq!(store.all_target_keys(), vec!["ns/b/t"]);
        let t = store.get_target_by_key("ns/b/t").expect("target present");
        assert_eq!(t.address, "other.example.com");
    }

    #[test]
    fn delete_targets_and_broker() {
        let store = MemoryTargets::new();
        store.mutate_broker("ns", "b", &mut |bm| {
            bm.upsert_targets([target("old"), target("keep")]);
        });
        store.mutate_broker("ns", "b", &mut |bm| {
            bm.delete_targets(["old", "missing"]);
        });
        assert_eq!(store.all_target_keys(), vec!["ns/b/keep"]);

        store.mutate_broker("ns", "b", &mut |bm| {
            bm.upsert_targets([target("late")]);
            bm.delete();
        });
        assert!(store.get_broker("ns", "b").is_none());
        assert!(store.all_target_keys().is_empty());
    }

    #[test]
    fn snapshots_are_unaffected_by_later_mutations() {
        let store = MemoryTargets::new();
        store.mutate_broker("ns", "b", &mut |bm| {
            bm.upsert_targets([target("t")]);
        });
        let before = store.get_broker("ns", "b").expect("broker");

        store.mutate_broker("ns", "b", &mut |bm| {
            bm.delete_targets(["t"]);
        });

        assert_eq!(before.targets.len(), 1);
        assert!(store.get_broker("ns", "b").expect("broker").targets.is_empty());
    }

    #[test]
    fn range_stops_early() {
        let store = MemoryTargets::new();
        for b in ["b0", "b1", "b2"] {
            store.mutate_broker("ns", b, &mut |bm| {
                bm.upsert_targets([target("x"), target("y")]);
            });
        }

        let mut seen = 0;
        store.range_all_targets(&mut |_| {
            seen += 1;
            seen < 3
        });
        assert_eq!(seen, 3);

        let mut brokers = 0;
        store.range_brokers(&mut |_| {
            brokers += 1;
            false
        });
        assert_eq!(brokers, 1);
    }

    #[test]
    fn slashes_in_names_keep_targets_apart() {
        let store = MemoryTargets::new();
        store.mutate_broker("a", "b/c", &mut |bm| {
            bm.upsert_targets([target("d")]);
        });
        store.mutate_broker("a/b", "c", &mut |bm| {
            bm.upsert_targets([target("d")]);
        });

        let keys = store.all_target_keys();
        assert_eq!(keys, vec!["a%2Fb/c/d", "a/b%2Fc/d"]);
        for key in &keys {
            let t = store.get_target_by_key(key).expect("lookup by own key");
            assert_eq!(&t.key(), key);
        }
        assert_eq!(store.get_target_by_key("a/b%2Fc/d").expect("t").broker, "b/c");
        assert!(store.get_target_by_key("a/b/c/d").is_none());
    }

    #[test]
    fn concurrent_writers_do_not_lose_edits() {
        let store = Arc::new(MemoryTargets::new());
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store.mutate_broker("ns", "shared", &mut |bm| {
                            bm.upsert_targets([target(&format!("t-{i}-{j}"))]);
                        });
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().expect("writer thread");
        }
        assert_eq!(store.all_target_keys().len(), 200);
    }
}
