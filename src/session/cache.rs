// Client cache of server-derived data, scoped to one session

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Query results keyed by request path. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.write().await.insert(key.into(), value);
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop everything; called when the owning session ends
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        tracing::debug!("Clearing {} cached queries", entries.len());
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
