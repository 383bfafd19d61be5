use async_trait::async_trait;
use serde_json::Value;

use super::errors::Result;
use super::watch::WatchStream;

/// Lifetime of a stored key.
///
/// Persistent keys survive until explicitly deleted. Ephemeral keys are bound
/// to the session that created them and disappear when that session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    Persistent,
    Ephemeral,
}

#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// Read the value stored at `key`. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Return the full paths of all keys stored under `path`.
    async fn get_childrens(&self, path: &str) -> Result<Vec<String>>;

    /// Write `value` at `key`, creating or replacing it.
    async fn put(&self, key: &str, value: Value, mode: CreateMode) -> Result<()>;

    /// Create `key` with `value`. Fails with `MetadataError::KeyExists` if the
    /// key is already present.
    async fn create(&self, key: &str, value: Value, mode: CreateMode) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Watch for changes to keys under `prefix`.
    async fn watch(&self, prefix: &str) -> Result<WatchStream>;
}
