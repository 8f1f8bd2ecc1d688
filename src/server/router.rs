use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, debug, health, sessions, validation, API_PREFIX};
use crate::state::AppState;

/// Creates the application router.
///
/// Liveness and service info live at the root; the agent API is nested
/// under [`API_PREFIX`]. CORS and request tracing wrap every route.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.allowed_origins);

    let api = Router::new()
        .route("/chat", post(chat::chat))
        .route("/session", post(sessions::create_session))
        .route(
            "/session/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/health", get(health::agent_health))
        .route("/debug/:session_id", get(debug::debug_session))
        .route("/validate-response", post(validation::validate_response));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest(API_PREFIX, api)
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// `configured` is already resolved by the config loader, local defaults
/// included when nothing was set.
fn build_cors_layer(configured: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origin_header_values(configured)))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn origin_header_values(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect()
}
