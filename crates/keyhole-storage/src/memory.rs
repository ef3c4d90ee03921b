use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keyhole_core::{StorageError, UrlRecord, UrlStore};

/// In-memory implementation of the primary store, backed by a DashMap.
///
/// Uniqueness is enforced atomically through the map's entry API, so
/// concurrent inserts of the same code race to a single winner exactly
/// like a unique index would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUrlStore {
    records: Arc<DashMap<String, UrlRecord>>,
}

impl InMemoryUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl UrlStore for InMemoryUrlStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StorageError> {
        Ok(self.records.get(code).map(|record| record.clone()))
    }

    async fn insert(&self, record: UrlRecord) -> Result<UrlRecord, StorageError> {
        match self.records.entry(record.short_code.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(record.short_code)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn delete(&self, code: &str) -> Result<bool, StorageError> {
        Ok(self.records.remove(code).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use uuid::Uuid;

    fn record(code: &str, url: &str) -> UrlRecord {
        UrlRecord {
            id: Uuid::new_v4(),
            short_code: code.to_string(),
            original_url: url.to_string(),
            created_at: Timestamp::now(),
            expires_at: None,
            click_count: 0,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let store = InMemoryUrlStore::new();
        let stored = store
            .insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        let fetched = store.get_by_code("abc123").await.unwrap();
        assert_eq!(fetched, Some(stored));
    }

    #[tokio::test]
    async fn get_missing_code_returns_none() {
        let store = InMemoryUrlStore::new();
        assert_eq!(store.get_by_code("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryUrlStore::new();
        store
            .insert(record("abc123", "https://one.example"))
            .await
            .unwrap();

        let err = store
            .insert(record("abc123", "https://two.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(code) if code == "abc123"));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_existed() {
        let store = InMemoryUrlStore::new();
        store
            .insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        assert!(store.delete("abc123").await.unwrap());
        assert!(!store.delete("abc123").await.unwrap());
        assert_eq!(store.get_by_code("abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_records_are_still_returned() {
        let store = InMemoryUrlStore::new();
        let mut expired = record("old123", "https://example.com");
        expired.expires_at = Some(Timestamp::now() - jiff::SignedDuration::from_secs(60));
        store.insert(expired.clone()).await.unwrap();

        // Expiry is the service's read-time predicate, not the store's.
        assert_eq!(store.get_by_code("old123").await.unwrap(), Some(expired));
    }
}
