use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, redirect_handler, shorten_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/shorten", post(shorten_handler))
            .route("/{alias}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
