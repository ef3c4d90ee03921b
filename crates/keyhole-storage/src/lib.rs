//! [`UrlStore`](keyhole_core::UrlStore) implementations.
//!
//! PostgreSQL is the durable backend; the in-memory store backs unit
//! and handler tests. The DDL for the Postgres schema lives under
//! `ddl/postgres/`.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUrlStore;
pub use postgres::PostgresUrlStore;
