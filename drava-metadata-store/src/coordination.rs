use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::errors::{MetadataError, Result};
use super::store::{CreateMode, MetadataStore};
use super::watch::WatchStream;
use super::MetadataStorage;

/// Typed facade over [`MetadataStorage`] used by the cluster services.
///
/// Creation is idempotent: `KeyExists` on create is swallowed. Values are
/// UTF-8 JSON; the generic parameters of [`CoordinationStore::get_json`] and
/// [`CoordinationStore::data_with_watch`] are the single injected
/// deserializer for each stored type.
#[derive(Debug, Clone)]
pub struct CoordinationStore {
    storage: MetadataStorage,
}

impl CoordinationStore {
    pub fn new(storage: MetadataStorage) -> Self {
        Self { storage }
    }

    /// Create `path` with `value` unless it already exists.
    pub async fn exists_or_create(
        &self,
        path: &str,
        value: Value,
        mode: CreateMode,
    ) -> Result<()> {
        match self.storage.create(path, value, mode).await {
            Ok(()) => Ok(()),
            Err(MetadataError::KeyExists(_)) => {
                debug!(path = %path, "path already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.storage.get(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, path: &str, value: &T, mode: CreateMode) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.storage.put(path, value, mode).await
    }

    pub async fn create_json<T: Serialize>(
        &self,
        path: &str,
        value: &T,
        mode: CreateMode,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.storage.create(path, value, mode).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.storage.delete(path).await
    }

    /// List the names of the keys stored directly under `path`.
    pub async fn children(&self, path: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let children = self
            .storage
            .get_childrens(path)
            .await?
            .into_iter()
            .filter_map(|full| full.strip_prefix(&prefix).map(|s| s.to_string()))
            .collect();
        Ok(children)
    }

    /// Current children of `path` plus a stream of subsequent changes under it.
    pub async fn children_with_watch(&self, path: &str) -> Result<(Vec<String>, WatchStream)> {
        let stream = self.storage.watch(path).await?;
        let children = self.children(path).await?;
        Ok((children, stream))
    }

    /// Current value at `path` plus a stream of subsequent changes to it.
    pub async fn data_with_watch<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<(Option<T>, WatchStream)> {
        let stream = self.storage.watch(path).await?;
        let value = self.get_json(path).await?;
        Ok((value, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde::Deserialize;

    async fn store() -> CoordinationStore {
        CoordinationStore::new(MetadataStorage::InMemory(MemoryStore::new().await.unwrap()))
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        rate: f64,
    }

    #[tokio::test]
    async fn test_exists_or_create_is_idempotent() {
        let store = store().await;
        store
            .exists_or_create("/loadbalance/brokers", Value::Null, CreateMode::Persistent)
            .await
            .unwrap();
        // second call swallows KeyExists
        store
            .exists_or_create("/loadbalance/brokers", Value::Null, CreateMode::Persistent)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_typed_read_back() {
        let store = store().await;
        store
            .set_json(
                "/loadbalance/bundle-data/ns/0x0_0x8",
                &Payload { rate: 50.0 },
                CreateMode::Persistent,
            )
            .await
            .unwrap();
        let read: Option<Payload> = store
            .get_json("/loadbalance/bundle-data/ns/0x0_0x8")
            .await
            .unwrap();
        assert_eq!(read, Some(Payload { rate: 50.0 }));
    }

    #[tokio::test]
    async fn test_data_with_watch_sees_later_updates() {
        use crate::WatchEvent;
        use futures::StreamExt;

        let store = store().await;
        let path = "/loadbalance/brokers/a:8080";
        store
            .set_json(path, &Payload { rate: 1.0 }, CreateMode::Ephemeral)
            .await
            .unwrap();

        let (current, mut stream) = store.data_with_watch::<Payload>(path).await.unwrap();
        assert_eq!(current, Some(Payload { rate: 1.0 }));

        store
            .set_json(path, &Payload { rate: 2.0 }, CreateMode::Ephemeral)
            .await
            .unwrap();
        match stream.next().await.unwrap().unwrap() {
            WatchEvent::Put { key, value } => {
                assert_eq!(key, path);
                let updated: Payload = serde_json::from_slice(&value).unwrap();
                assert_eq!(updated, Payload { rate: 2.0 });
            }
            other => panic!("expected Put, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_children_strip_parent_path() {
        let store = store().await;
        store
            .set_json("/loadbalance/brokers/a:8080", &Payload { rate: 1.0 }, CreateMode::Ephemeral)
            .await
            .unwrap();
        store
            .set_json("/loadbalance/brokers/b:8080", &Payload { rate: 2.0 }, CreateMode::Ephemeral)
            .await
            .unwrap();

        let children = store.children("/loadbalance/brokers").await.unwrap();
        assert_eq!(children, vec!["a:8080".to_string(), "b:8080".to_string()]);
    }
}
