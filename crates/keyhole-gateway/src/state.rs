use keyhole_core::UrlShortening;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<dyn UrlShortening>,
}

impl AppState {
    /// Creates handler state over any URL shortening service.
    pub fn new(service: impl UrlShortening) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// The URL shortening service behind every handler.
    pub fn service(&self) -> &dyn UrlShortening {
        self.service.as_ref()
    }
}
