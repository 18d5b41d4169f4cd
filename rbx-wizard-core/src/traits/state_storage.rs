//! Durable local state abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CoreResult;

/// Durable key/value storage for local UI state
///
/// Values are opaque strings (JSON documents). Callers own the format and must
/// tolerate values they cannot parse.
///
/// Implementations:
/// - `InMemoryStateStorage` (tests, ephemeral sessions)
/// - `JsonFileStateStorage` in the app crate (one file per key)
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Returns
    /// * `Some(value)` - a value exists
    /// * `None` - nothing stored yet
    async fn load(&self, key: &str) -> CoreResult<Option<String>>;

    /// Replace the value stored under `key`
    async fn store(&self, key: &str, value: &str) -> CoreResult<()>;
}

/// In-memory state storage
#[derive(Clone, Default)]
pub struct InMemoryStateStorage {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStateStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one value.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = HashMap::new();
        values.insert(key.into(), value.into());
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }
}

#[async_trait]
impl StateStorage for InMemoryStateStorage {
    async fn load(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> CoreResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
