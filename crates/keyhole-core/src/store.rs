use crate::error::StorageError;
use crate::record::UrlRecord;
use async_trait::async_trait;

/// The primary store of URL records, keyed by short code.
///
/// The primary store exclusively owns durable state and enforces short
/// code uniqueness. Implementations must be safe for concurrent use.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Retrieves the record for a short code.
    ///
    /// Returns `Ok(None)` if the code does not exist. Expired records
    /// are still returned; expiry is evaluated by the service at read
    /// time.
    async fn get_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StorageError>;

    /// Inserts a new record and returns the stored snapshot.
    ///
    /// Returns [`StorageError::Conflict`] if the short code is already
    /// taken by a live record.
    async fn insert(&self, record: UrlRecord) -> Result<UrlRecord, StorageError>;

    /// Deletes the record for a short code.
    ///
    /// Returns `Ok(true)` if the record existed and was removed, and
    /// `Ok(false)` if there was nothing to delete.
    async fn delete(&self, code: &str) -> Result<bool, StorageError>;
}
