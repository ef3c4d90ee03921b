//! Repository decorators over the primary store.

pub mod cached;

pub use cached::{CachedRepository, CachedRepositoryConfig};
