use thiserror::Error;

/// Errors reported by [`UrlStore`](crate::store::UrlStore) implementations.
///
/// Variants carry rendered messages rather than source errors so that
/// results can be cloned across a shared in-flight load.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors reported by [`CacheStore`](crate::cache::CacheStore) implementations.
///
/// A missing key is not an error; it is `Ok(None)` on the trait. Every
/// variant here represents a transport or protocol fault.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors surfaced by the URL service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("url not found: {0}")]
    NotFound(String),
    #[error("url has expired: {0}")]
    Expired(String),
    #[error("custom alias already exists: {0}")]
    CodeExists(String),
    #[error("invalid custom alias: {0}")]
    InvalidAlias(String),
    #[error("short code generation failed: {0}")]
    GenerationFailed(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
