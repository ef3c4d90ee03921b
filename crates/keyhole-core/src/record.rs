use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored URL record.
///
/// The short code is the canonical lookup key; the id is opaque to
/// everything but the primary store. Records are never mutated in place
/// after insertion: `click_count` belongs to a separate analytics
/// pipeline and is only carried here.
///
/// The serialized form is the cache wire format, so the field names and
/// RFC-3339 timestamps are part of the external interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Opaque unique identifier, assigned on insert.
    pub id: Uuid,
    /// The short code, unique across live records.
    pub short_code: String,
    /// The original URL that was shortened.
    pub original_url: String,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record expires, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// Redirect count, maintained by an external analytics pipeline.
    #[serde(default)]
    pub click_count: i64,
}

impl UrlRecord {
    /// Whether the record was expired at `now`.
    ///
    /// A record is expired iff its expiry is present and strictly in the
    /// past. Expiry is a read-time predicate, not a persisted state
    /// change; expired rows stay in the primary store until deleted.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }

    /// Whether the record is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}
