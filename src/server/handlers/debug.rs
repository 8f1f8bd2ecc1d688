use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Session snapshot plus the redacted configuration in effect.
pub async fn debug_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.agent.get_conversation_session(&session_id).await?;
    Ok(Json(json!({
        "session_id": session_id,
        "session_found": session.is_some(),
        "session": session,
        "config": state.config.redacted(),
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
