use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// The sentinel value cached for short codes that are known to be absent
/// from the primary store.
///
/// The exact byte string is part of the external interface; operators
/// and tests inspect it directly.
pub const NOT_FOUND_SENTINEL: &[u8] = b"__NOT_FOUND__";

/// Builds the cache key for a short code.
///
/// The literal `url:<short_code>` form is stable: it is observable by
/// operators and relied on by tests.
pub fn cache_key(code: &str) -> String {
    format!("url:{code}")
}

/// A best-effort key-value cache with per-entry TTLs.
///
/// The cache is a non-authoritative view of the primary store. Values
/// are opaque bytes; serialization belongs to the caller. `Ok(None)`
/// means the key is absent, which is an ordinary miss and must stay
/// distinguishable from transport errors.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Fetches the value for a key. Returns `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores a value under a key with the given TTL.
    ///
    /// A zero TTL means the entry does not expire.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Removes the value for a key. Removing an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
