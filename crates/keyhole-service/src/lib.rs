//! The Keyhole core: resilient cached repository and URL service.
//!
//! This crate sits between the HTTP layer and the two backing stores.
//! [`CachedRepository`] decorates a primary [`UrlStore`] with cache-aside
//! reads, negative caching, singleflight stampede control, and a circuit
//! breaker that keeps cache outages off the read path. [`UrlService`]
//! implements the business rules on top: deterministic short code
//! generation with collision retries, custom aliases, and read-time
//! expiry.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use keyhole_core::{CreateUrlRequest, UrlShortening};
//! use keyhole_resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use keyhole_service::{CachedRepository, CachedRepositoryConfig, UrlService, UrlServiceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(keyhole_storage::InMemoryUrlStore::new());
//! let cache = Arc::new(keyhole_cache::InMemoryCacheStore::new());
//! let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::builder().build()));
//!
//! let repository = CachedRepository::new(
//!     store,
//!     Some(cache),
//!     breaker,
//!     CachedRepositoryConfig::builder().build(),
//! );
//! let service = UrlService::new(
//!     Arc::new(repository),
//!     UrlServiceConfig::builder().base_url("https://key.hole").build(),
//! );
//!
//! let created = service
//!     .create_short_url(CreateUrlRequest {
//!         url: "https://example.com/page".to_string(),
//!         custom_alias: None,
//!         expires_in_days: None,
//!     })
//!     .await?;
//! assert_eq!(service.redirect(&created.short_code).await?, "https://example.com/page");
//! # Ok(())
//! # }
//! ```

pub mod repository;
pub mod service;
pub mod shortcode;

pub use repository::{CachedRepository, CachedRepositoryConfig};
pub use service::{UrlService, UrlServiceConfig};
pub use shortcode::ShortCodeGenerator;

// Re-export the service surface so downstream crates only need this one.
pub use keyhole_core::{
    CreateUrlRequest, CreateUrlResponse, ServiceError, UrlResponse, UrlShortening,
};
