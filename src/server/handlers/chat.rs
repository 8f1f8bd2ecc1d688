use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::agent::{AgentRequest, AgentResponse};
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    let response = state.agent.process_request(&request).await?;
    Ok(Json(response))
}
