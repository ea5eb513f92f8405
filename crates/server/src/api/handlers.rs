//! Operational JSON endpoints next to the form.

use axum::{extract::State, Json};
use mashup_core::SanitizedConfig;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness only; does not probe yt-dlp, ffmpeg or SMTP.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Effective configuration with the SMTP password replaced by a flag.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}
