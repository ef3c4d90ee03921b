//! HTTP gateway for the Keyhole URL shortener.
//!
//! Routes, handlers, and error mapping over the
//! [`UrlShortening`](keyhole_core::UrlShortening) service surface.
//! Configuration comes from environment variables; wiring lives in the
//! binary.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use config::GatewayConfig;
pub use state::AppState;
