//! Gateway-level wire types. The service request/response DTOs live in
//! `keyhole_core` and are used by the handlers directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Canonical reason for the HTTP status, e.g. "Not Found".
    pub error: String,
    /// Human-readable detail.
    pub message: String,
}
