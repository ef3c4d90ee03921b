//! Disposable backing services for Keyhole integration tests.

pub mod error;
pub mod postgres;
pub mod redis;

pub use error::{InfraError, Result};
pub use postgres::{PostgresConfig, PostgresServer};
pub use redis::RedisServer;
