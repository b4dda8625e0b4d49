//! `GET /health`: liveness plus a summary of the loaded reward config.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "tiers": state.pipeline.sampler().table().len(),
        "pool_size": state.pipeline.pool().len(),
    }))
}
