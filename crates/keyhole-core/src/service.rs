use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUrlRequest {
    /// The original URL to be shortened.
    pub url: String,
    /// Optional custom alias to use instead of a generated code.
    #[serde(default)]
    pub custom_alias: Option<String>,
    /// Days until expiry; zero or absent means the URL never expires.
    #[serde(default)]
    pub expires_in_days: Option<u32>,
}

/// Response for a created short URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUrlResponse {
    pub short_code: String,
    pub short_url: String,
    /// Expiry as an RFC-3339 string, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Full URL metadata projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResponse {
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    /// Creation time as an RFC-3339 string.
    pub created_at: String,
    /// Expiry as an RFC-3339 string, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub click_count: i64,
}

/// The URL shortening service surface consumed by the HTTP layer.
#[async_trait]
pub trait UrlShortening: Send + Sync + 'static {
    /// Creates a shortened URL, either from a custom alias or from the
    /// deterministic generator.
    async fn create_short_url(
        &self,
        request: CreateUrlRequest,
    ) -> Result<CreateUrlResponse, ServiceError>;

    /// Retrieves URL metadata by short code.
    async fn get_url(&self, code: &str) -> Result<UrlResponse, ServiceError>;

    /// Resolves a short code to its original URL for redirection.
    async fn redirect(&self, code: &str) -> Result<String, ServiceError>;

    /// Deletes a shortened URL by its short code.
    async fn delete_url(&self, code: &str) -> Result<(), ServiceError>;
}
