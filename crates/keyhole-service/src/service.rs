use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use keyhole_core::{
    CreateUrlRequest, CreateUrlResponse, ServiceError, StorageError, UrlRecord, UrlResponse,
    UrlShortening, UrlStore,
};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::shortcode::{canonicalize, ShortCodeGenerator};

const MIN_ALIAS_LENGTH: usize = 3;
const MAX_ALIAS_LENGTH: usize = 32;

/// Configuration for a [`UrlService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct UrlServiceConfig {
    /// Prefix for constructed short URLs.
    #[builder(setter(into))]
    pub base_url: String,
    /// Length of generated short codes.
    #[builder(default = 7)]
    pub short_code_length: usize,
    /// Bound on the generate-and-insert loop.
    #[builder(default = 5)]
    pub short_code_retries: u32,
}

/// Business rules for URL shortening.
///
/// The service owns expiry computation, custom alias handling, and the
/// collision-retry loop over the deterministic generator. It retries
/// only on short code conflicts, and only for generated codes; every
/// other repository error surfaces immediately.
pub struct UrlService {
    repository: Arc<dyn UrlStore>,
    generator: ShortCodeGenerator,
    base_url: String,
    short_code_retries: u32,
}

impl UrlService {
    pub fn new(repository: Arc<dyn UrlStore>, config: UrlServiceConfig) -> Self {
        Self {
            repository,
            generator: ShortCodeGenerator::new(config.short_code_length),
            base_url: config.base_url,
            short_code_retries: config.short_code_retries,
        }
    }

    fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), code)
    }

    fn new_record(
        &self,
        short_code: String,
        original_url: String,
        expires_at: Option<Timestamp>,
    ) -> UrlRecord {
        UrlRecord {
            id: Uuid::new_v4(),
            short_code,
            original_url,
            created_at: Timestamp::now(),
            expires_at,
            click_count: 0,
        }
    }

    fn create_response(&self, record: &UrlRecord) -> CreateUrlResponse {
        CreateUrlResponse {
            short_url: self.short_url(&record.short_code),
            short_code: record.short_code.clone(),
            expires_at: record.expires_at.map(|ts| ts.to_string()),
        }
    }

    /// Fetches a record and applies the read-time expiry predicate.
    async fn get_live_record(&self, code: &str) -> Result<UrlRecord, ServiceError> {
        let record = self
            .repository
            .get_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))?;

        if record.is_expired() {
            debug!(code, "record has expired");
            return Err(ServiceError::Expired(code.to_string()));
        }
        Ok(record)
    }
}

fn expiry_from_days(expires_in_days: Option<u32>) -> Option<Timestamp> {
    match expires_in_days {
        Some(days) if days > 0 => {
            Some(Timestamp::now() + SignedDuration::from_hours(24 * i64::from(days)))
        }
        _ => None,
    }
}

fn validate_alias(alias: &str) -> Result<(), ServiceError> {
    if alias.len() < MIN_ALIAS_LENGTH || alias.len() > MAX_ALIAS_LENGTH {
        return Err(ServiceError::InvalidAlias(format!(
            "length must be between {} and {}, got {}",
            MIN_ALIAS_LENGTH,
            MAX_ALIAS_LENGTH,
            alias.len()
        )));
    }
    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ServiceError::InvalidAlias(format!(
            "must contain only alphanumeric characters, hyphens, or underscores: '{alias}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl UrlShortening for UrlService {
    async fn create_short_url(
        &self,
        request: CreateUrlRequest,
    ) -> Result<CreateUrlResponse, ServiceError> {
        let CreateUrlRequest {
            url,
            custom_alias,
            expires_in_days,
        } = request;

        if url.trim().is_empty() {
            return Err(ServiceError::InvalidUrl("URL cannot be empty".to_string()));
        }
        // Syntactic validation; the generated path re-canonicalizes per
        // attempt anyway, but the alias path needs it too.
        canonicalize(&url)?;

        let expires_at = expiry_from_days(expires_in_days);

        if let Some(alias) = custom_alias.as_deref().filter(|a| !a.is_empty()) {
            validate_alias(alias)?;

            let record = self.new_record(alias.to_string(), url, expires_at);
            let stored = self.repository.insert(record).await.map_err(|e| match e {
                StorageError::Conflict(_) => {
                    warn!(alias, "custom alias already exists");
                    ServiceError::CodeExists(alias.to_string())
                }
                other => ServiceError::Storage(other),
            })?;

            info!(code = %stored.short_code, url = %stored.original_url, "created short url with custom alias");
            return Ok(self.create_response(&stored));
        }

        for attempt in 0..self.short_code_retries {
            // Appending the attempt index changes the canonical input,
            // so each retry yields a different deterministic candidate.
            let candidate = self.generator.generate(&format!("{url}{attempt}"))?;

            let record = self.new_record(candidate.clone(), url.clone(), expires_at);
            match self.repository.insert(record).await {
                Ok(stored) => {
                    info!(code = %stored.short_code, url = %stored.original_url, attempt, "created short url");
                    return Ok(self.create_response(&stored));
                }
                Err(StorageError::Conflict(_)) => {
                    warn!(code = %candidate, attempt, "short code collision, retrying");
                }
                Err(other) => return Err(ServiceError::Storage(other)),
            }
        }

        Err(ServiceError::GenerationFailed(format!(
            "no unique short code after {} attempts",
            self.short_code_retries
        )))
    }

    async fn get_url(&self, code: &str) -> Result<UrlResponse, ServiceError> {
        let record = self.get_live_record(code).await?;

        Ok(UrlResponse {
            short_url: self.short_url(&record.short_code),
            short_code: record.short_code,
            original_url: record.original_url,
            created_at: record.created_at.to_string(),
            expires_at: record.expires_at.map(|ts| ts.to_string()),
            click_count: record.click_count,
        })
    }

    async fn redirect(&self, code: &str) -> Result<String, ServiceError> {
        let record = self.get_live_record(code).await?;
        debug!(code, target = %record.original_url, "redirecting");
        Ok(record.original_url)
    }

    async fn delete_url(&self, code: &str) -> Result<(), ServiceError> {
        if !self.repository.delete(code).await? {
            return Err(ServiceError::NotFound(code.to_string()));
        }
        info!(code, "deleted short url");
        Ok(())
    }
}
