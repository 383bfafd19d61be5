//! # Drava Metadata Store
//!
//! Coordination store abstraction for the drava broker cluster: a
//! hierarchical, watchable key-value service with persistent and
//! session-ephemeral keys.
//!
//! The [`MetadataStore`] trait is implemented by backends; [`MemoryStore`] is
//! the in-memory backend used in tests. [`CoordinationStore`] is the typed
//! facade the cluster services program against.

mod errors;
pub use errors::MetadataError;
pub(crate) use errors::Result;

mod store;
pub use store::{CreateMode, MetadataStore};

mod watch;
pub use watch::{WatchEvent, WatchStream};

mod memory_store;
pub use memory_store::MemoryStore;

mod coordination;
pub use coordination::CoordinationStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Backend selection for the coordination store.
///
/// Production plugs a remote backend behind `Arc<dyn MetadataStore>`; tests
/// use the in-memory backend.
pub enum MetadataStorage {
    Remote(Arc<dyn MetadataStore>),
    InMemory(MemoryStore),
}

impl Clone for MetadataStorage {
    fn clone(&self) -> Self {
        match self {
            Self::Remote(s) => Self::Remote(Arc::clone(s)),
            Self::InMemory(s) => Self::InMemory(s.clone()),
        }
    }
}

impl fmt::Debug for MetadataStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(_) => f.debug_tuple("Remote").field(&"...").finish(),
            Self::InMemory(s) => f.debug_tuple("InMemory").field(s).finish(),
        }
    }
}

#[async_trait]
impl MetadataStore for MetadataStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self {
            Self::Remote(s) => s.get(key).await,
            Self::InMemory(s) => s.get(key).await,
        }
    }

    async fn get_childrens(&self, path: &str) -> Result<Vec<String>> {
        match self {
            Self::Remote(s) => s.get_childrens(path).await,
            Self::InMemory(s) => s.get_childrens(path).await,
        }
    }

    async fn put(&self, key: &str, value: Value, mode: CreateMode) -> Result<()> {
        match self {
            Self::Remote(s) => s.put(key, value, mode).await,
            Self::InMemory(s) => s.put(key, value, mode).await,
        }
    }

    async fn create(&self, key: &str, value: Value, mode: CreateMode) -> Result<()> {
        match self {
            Self::Remote(s) => s.create(key, value, mode).await,
            Self::InMemory(s) => s.create(key, value, mode).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Self::Remote(s) => s.delete(key).await,
            Self::InMemory(s) => s.delete(key).await,
        }
    }

    async fn watch(&self, prefix: &str) -> Result<WatchStream> {
        match self {
            Self::Remote(s) => s.watch(prefix).await,
            Self::InMemory(s) => s.watch(prefix).await,
        }
    }
}
