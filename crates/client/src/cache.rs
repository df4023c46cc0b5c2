//! Tag-based query cache.
//!
//! Read queries are cached under a key and one tag (the resource path).
//! Every mutation invalidates its tag, so the next read refetches. There
//! are no optimistic updates.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Entry {
    tag: String,
    value: serde_json::Value,
}

/// Shared cache of decoded JSON responses.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().await.get(key).map(|e| e.value.clone())
    }

    pub async fn put(&self, key: &str, tag: &str, value: serde_json::Value) {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                tag: tag.to_string(),
                value,
            },
        );
    }

    /// Drop every entry carrying `tag`. Returns how many were dropped.
    pub async fn invalidate(&self, tag: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| e.tag != tag);
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(tag, dropped, "Invalidated cached queries");
        }
        dropped
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn invalidate_drops_only_matching_tag() {
        let cache = QueryCache::new();
        cache.put("/brand?page=1", "/brand", json!([1])).await;
        cache.put("/brand?page=2", "/brand", json!([2])).await;
        cache.put("/models", "/models", json!([3])).await;

        assert_eq!(cache.invalidate("/brand").await, 2);
        assert!(cache.get("/brand?page=1").await.is_none());
        assert_eq!(cache.get("/models").await, Some(json!([3])));
        assert_eq!(cache.len().await, 1);
    }
}
