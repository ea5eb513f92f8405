use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, mashup};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Form
        .route("/", get(mashup::index))
        .route("/mashup", post(mashup::submit))
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
