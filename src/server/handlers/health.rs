use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "name": state.config.agent.name,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "api_prefix": super::API_PREFIX,
    }))
}

/// Liveness only; collaborators are not contacted.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn agent_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let retrieval_connected = state.agent.validate_retrieval_connection().await;
    let llm_connected = state.agent.validate_completion_connection().await;
    let status = if retrieval_connected {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "retrieval_connected": retrieval_connected,
        "llm_connected": llm_connected,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
