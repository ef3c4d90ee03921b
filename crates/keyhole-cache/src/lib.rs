//! [`CacheStore`](keyhole_core::CacheStore) implementations.
//!
//! The Redis store is the production backend; the in-memory store backs
//! tests and single-node deployments. Both stores hold opaque bytes —
//! record serialization and the negative sentinel are owned by the
//! cached repository, not by the cache.

pub mod memory;
pub mod redis;

pub use memory::InMemoryCacheStore;
pub use redis::RedisCacheStore;
