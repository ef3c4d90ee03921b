use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{
    create_url_handler, delete_url_handler, get_url_handler, health_handler, redirect_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/api/v1",
                Router::new().route("/shorten", post(create_url_handler)).route(
                    "/urls/:short_code",
                    get(get_url_handler).delete(delete_url_handler),
                ),
            )
            // The public redirect route is registered last so it cannot
            // shadow the API routes.
            .route("/:short_code", get(redirect_handler))
            .with_state(state)
    }
}
