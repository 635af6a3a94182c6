//! HTTP API
//!
//! # Endpoints
//!
//! - `GET /health` - liveness probe
//! - `POST /api/chat` - run one conversation turn
//! - `GET /api/agents` - list the agent registry
//! - `GET /api/conversations/{id}` - stored conversation state

/// Request handlers for all API endpoints.
pub mod handlers;
/// Route definitions.
pub mod routes;

use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "aerodesk",
        "version": env!("CARGO_PKG_VERSION"),
        "agents": state.registry.len(),
    }))
}

/// CORS for the configured origins; `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

/// Full application router with state, CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    Router::new()
        .route("/health", get(health))
        .nest("/api", routes::create_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
