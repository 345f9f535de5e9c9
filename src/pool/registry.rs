//! # Handler registry: the pool's `key → handler` map.
//!
//! ## Rules
//! - The sync loop is the only writer; any number of inspectors may read.
//! - Write locks cover one insert/remove/drain and are never held across a
//!   handler or factory call, so readers are never held out for long.
//! - Every entry owns the child token its handler was started with.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::handlers::HandlerRef;

/// A running handler and the token it was started with.
pub(crate) struct Entry {
    pub handler: HandlerRef,
    pub token: CancellationToken,
}

/// Concurrency-safe map of active handlers.
pub(crate) struct Registry {
    handlers: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the current key set.
    pub async fn key_set(&self) -> HashSet<String> {
        self.handlers.read().await.keys().cloned().collect()
    }

    /// Returns sorted list of active keys.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.read().await.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.handlers.read().await.contains_key(key)
    }

    pub async fn get(&self, key: &str) -> Option<HandlerRef> {
        self.handlers
            .read()
            .await
            .get(key)
            .map(|e| HandlerRef::clone(&e.handler))
    }

    /// Inserts an entry; an occupied key is left untouched and the new entry is
    /// handed back.
    pub async fn insert(&self, key: String, entry: Entry) -> Result<(), Entry> {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&key) {
            return Err(entry);
        }
        handlers.insert(key, entry);
        Ok(())
    }

    /// Atomically removes an entry.
    pub async fn take(&self, key: &str) -> Option<Entry> {
        self.handlers.write().await.remove(key)
    }

    /// Removes every entry.
    pub async fn drain(&self) -> Vec<(String, Entry)> {
        self.handlers.write().await.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::HandlerError;
    use crate::handlers::Handler;

    struct Idle;

    #[async_trait]
    impl Handler for Idle {
        async fn start(&self, _token: CancellationToken) -> Result<(), HandlerError> {
            Ok(())
        }

        async fn stop(&self) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn entry() -> Entry {
        Entry {
            handler: Arc::new(Idle),
            token: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn insert_refuses_duplicates() {
        let reg = Registry::new();
        assert!(reg.insert("a".into(), entry()).await.is_ok());

        let first = reg.get("a").await.expect("present");
        assert!(reg.insert("a".into(), entry()).await.is_err());
        let still = reg.get("a").await.expect("present");
        assert!(Arc::ptr_eq(&first, &still));
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn take_and_drain() {
        let reg = Registry::new();
        for k in ["b", "a", "c"] {
            assert!(reg.insert(k.into(), entry()).await.is_ok());
        }
        assert_eq!(reg.keys().await, vec!["a", "b", "c"]);

        assert!(reg.take("b").await.is_some());
        assert!(reg.take("b").await.is_none());
        assert!(!reg.contains("b").await);

        let drained = reg.drain().await;
        assert_eq!(drained.len(), 2);
        assert!(reg.key_set().await.is_empty());
    }
}
