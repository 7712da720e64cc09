use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A browser storage area (local or session)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> crate::Result<Option<Value>>;

    /// Bulk read of every key in the area
    async fn get_all(&self) -> crate::Result<Map<String, Value>>;

    async fn set(&self, key: &str, value: Value) -> crate::Result<()>;

    async fn remove(&self, key: &str) -> crate::Result<()>;
}

/// In-memory storage area
///
/// Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }

    /// Snapshot of the current contents
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.values.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> crate::Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn get_all(&self) -> crate::Result<Map<String, Value>> {
        Ok(self.snapshot().await)
    }

    async fn set(&self, key: &str, value: Value) -> crate::Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> crate::Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}
