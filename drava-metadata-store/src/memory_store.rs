use super::{
    errors::{MetadataError, Result},
    store::{CreateMode, MetadataStore},
    watch::{WatchEvent, WatchStream},
};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// MemoryStore is a simple in-memory key-value store that implements the
/// MetadataStore trait. SHOULD BE USED ONLY FOR TESTING PURPOSES
///
/// Ephemeral keys are tracked so that tests can simulate a session drop via
/// [`MemoryStore::expire_session`], which removes them and notifies watchers
/// the way a real coordination service would on session loss.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Value>>,
    ephemerals: Arc<DashSet<String>>,
    watchers: Arc<DashMap<String, broadcast::Sender<WatchEvent>>>,
}

impl MemoryStore {
    pub async fn new() -> Result<Self> {
        Ok(MemoryStore {
            inner: Arc::new(DashMap::new()),
            ephemerals: Arc::new(DashSet::new()),
            watchers: Arc::new(DashMap::new()),
        })
    }

    fn notify_watchers(&self, event: WatchEvent) {
        for entry in self.watchers.iter() {
            if event.key().starts_with(entry.key()) {
                let _ = entry.value().send(event.clone());
            }
        }
    }

    fn validate_key(key: &str) -> Result<()> {
        if !key.starts_with('/') || key.ends_with('/') || key.len() < 2 {
            return Err(MetadataError::InvalidArguments(format!(
                "key must be an absolute path: {}",
                key
            )));
        }
        Ok(())
    }

    /// Drop every ephemeral key, as a coordination service would when the
    /// owning session expires.
    pub fn expire_session(&self) {
        let keys: Vec<String> = self.ephemerals.iter().map(|k| k.key().clone()).collect();
        self.ephemerals.clear();
        for key in keys {
            self.inner.remove(&key);
            self.notify_watchers(WatchEvent::Delete { key });
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.get(key).map(|entry| entry.value().clone()))
    }

    async fn get_childrens(&self, path: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut child_paths: Vec<String> = self
            .inner
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect();
        child_paths.sort();
        Ok(child_paths)
    }

    async fn put(&self, key: &str, value: Value, mode: CreateMode) -> Result<()> {
        Self::validate_key(key)?;
        let value_bytes = serde_json::to_vec(&value)?;
        self.inner.insert(key.to_string(), value);
        if mode == CreateMode::Ephemeral {
            self.ephemerals.insert(key.to_string());
        }
        self.notify_watchers(WatchEvent::Put {
            key: key.to_string(),
            value: value_bytes,
        });
        Ok(())
    }

    async fn create(&self, key: &str, value: Value, mode: CreateMode) -> Result<()> {
        Self::validate_key(key)?;
        if self.inner.contains_key(key) {
            return Err(MetadataError::KeyExists(key.to_string()));
        }
        self.put(key, value, mode).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Self::validate_key(key)?;
        self.inner.remove(key);
        self.ephemerals.remove(key);
        self.notify_watchers(WatchEvent::Delete {
            key: key.to_string(),
        });
        Ok(())
    }

    async fn watch(&self, prefix: &str) -> Result<WatchStream> {
        let rx = match self.watchers.get(prefix) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(256);
                self.watchers.insert(prefix.to_string(), tx);
                rx
            }
        };
        Ok(WatchStream::from_broadcast(rx))
    }
}
