use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::agent::{AgentResponse, ValidationReport};
use crate::state::AppState;

pub async fn validate_response(
    State(state): State<Arc<AppState>>,
    Json(response): Json<AgentResponse>,
) -> Json<ValidationReport> {
    Json(state.agent.validate_response(&response))
}
