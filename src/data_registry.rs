use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::embeddings::DocumentIndex;
use crate::extraction::DocumentFormat;

pub const DEFAULT_CAPACITY: usize = 16;
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// A built index together with what it was built from
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub file_id: String,
    pub format: DocumentFormat,
    pub index: Arc<DocumentIndex>,
}

struct CachedIndex {
    record: IndexRecord,
    built_at: Instant,
    last_used: Instant,
}

/// Indexes of uploaded documents, keyed by storage file id.
///
/// Holds at most `capacity` entries, evicting the least recently used one
/// when full. An entry older than `ttl` is dropped on access so a document
/// changed or deleted in storage is rebuilt or reported missing.
#[derive(Clone)]
pub struct DocumentIndexRegistry {
    inner: Arc<RwLock<HashMap<String, CachedIndex>>>,
    capacity: usize,
    ttl: Duration,
}

impl Default for DocumentIndexRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl DocumentIndexRegistry {
    /// A `capacity` of 0 disables caching
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            capacity,
            ttl,
        }
    }

    pub async fn insert(&self, record: IndexRecord) {
        if self.capacity == 0 {
            return;
        }

        let mut guard = self.inner.write().await;
        let ttl = self.ttl;
        guard.retain(|_, cached| cached.built_at.elapsed() < ttl);

        if !guard.contains_key(&record.file_id) && guard.len() >= self.capacity {
            let oldest = guard
                .iter()
                .min_by_key(|(_, cached)| cached.last_used)
                .map(|(file_id, _)| file_id.clone());
            if let Some(file_id) = oldest {
                debug!(file_id = %file_id, "Evicting least recently used document index");
                guard.remove(&file_id);
            }
        }

        let now = Instant::now();
        guard.insert(
            record.file_id.clone(),
            CachedIndex {
                record,
                built_at: now,
                last_used: now,
            },
        );
    }

    pub async fn get(&self, file_id: &str) -> Option<IndexRecord> {
        let mut guard = self.inner.write().await;
        let expired = guard.get(file_id)?.built_at.elapsed() >= self.ttl;
        if expired {
            debug!(file_id = %file_id, "Document index expired");
            guard.remove(file_id);
            return None;
        }

        let cached = guard.get_mut(file_id)?;
        cached.last_used = Instant::now();
        Some(cached.record.clone())
    }

    pub async fn remove(&self, file_id: &str) -> Option<IndexRecord> {
        let mut guard = self.inner.write().await;
        guard.remove(file_id).map(|cached| cached.record)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file_id: &str) -> IndexRecord {
        IndexRecord {
            file_id: file_id.to_string(),
            format: DocumentFormat::Txt,
            index: Arc::new(DocumentIndex::default()),
        }
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = DocumentIndexRegistry::default();
        registry.insert(record("f1")).await;

        let found = registry.get("f1").await.unwrap();
        assert_eq!(found.format, DocumentFormat::Txt);
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove("f1").await.is_some());
        assert!(registry.get("f1").await.is_none());
        assert!(registry.remove("f1").await.is_none());
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used_when_full() {
        let registry = DocumentIndexRegistry::new(2, DEFAULT_TTL);
        registry.insert(record("a")).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        registry.insert(record("b")).await;
        tokio::time::sleep(Duration::from_millis(2)).await;

        // touching "a" makes "b" the eviction candidate
        assert!(registry.get("a").await.is_some());
        tokio::time::sleep(Duration::from_millis(2)).await;
        registry.insert(record("c")).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get("a").await.is_some());
        assert!(registry.get("b").await.is_none());
        assert!(registry.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_reinsert_does_not_evict() {
        let registry = DocumentIndexRegistry::new(2, DEFAULT_TTL);
        registry.insert(record("a")).await;
        registry.insert(record("b")).await;
        registry.insert(record("b")).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get("a").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let registry = DocumentIndexRegistry::new(4, Duration::ZERO);
        registry.insert(record("a")).await;

        assert!(registry.get("a").await.is_none());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_caching() {
        let registry = DocumentIndexRegistry::new(0, DEFAULT_TTL);
        registry.insert(record("a")).await;

        assert_eq!(registry.len().await, 0);
        assert!(registry.get("a").await.is_none());
    }
}
