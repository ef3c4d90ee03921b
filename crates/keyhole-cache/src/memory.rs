use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use keyhole_core::{CacheError, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    /// `None` means the entry never expires.
    deadline: Option<Instant>,
}

impl Entry {
    fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}

/// An in-memory [`CacheStore`] with per-entry TTLs.
///
/// Expired entries are evicted lazily on read. Intended for tests and
/// single-node deployments; it never fails, which also makes it a
/// convenient healthy-cache stand-in next to fault-injecting test
/// doubles.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired_at(Instant::now()) {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let deadline = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                deadline,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_and_set_round_trip() {
        let cache = InMemoryCacheStore::new();

        assert_eq!(cache.get("url:abc").await.unwrap(), None);
        cache
            .set("url:abc", b"payload", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            cache.get("url:abc").await.unwrap(),
            Some(b"payload".to_vec())
        );
    }

    #[tokio::test]
    async fn overwrites_existing_entries() {
        let cache = InMemoryCacheStore::new();

        cache.set("url:abc", b"old", Duration::ZERO).await.unwrap();
        cache.set("url:abc", b"new", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("url:abc").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let cache = InMemoryCacheStore::new();

        cache
            .set("url:abc", b"payload", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(cache.get("url:abc").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("url:abc").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let cache = InMemoryCacheStore::new();

        cache.set("url:abc", b"payload", Duration::ZERO).await.unwrap();
        cache.del("url:abc").await.unwrap();
        assert_eq!(cache.get("url:abc").await.unwrap(), None);

        // Deleting an absent key is not an error.
        cache.del("url:abc").await.unwrap();
    }
}
