//! Resilience primitives shared across Keyhole services.
//!
//! This crate provides the [`CircuitBreaker`] that isolates a failing
//! dependency and the [`Singleflight`] coordinator that coalesces
//! concurrent loads for the same key. Both are self-contained and know
//! nothing about URLs; the cached repository composes them.

pub mod breaker;
pub mod singleflight;

pub use breaker::{BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use singleflight::{FlightError, Singleflight};
