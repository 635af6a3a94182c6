use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Routes mounted under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(crate::api::handlers::chat::chat))
        .route("/agents", get(crate::api::handlers::agents::list_agents))
        .route(
            "/conversations/{id}",
            get(crate::api::handlers::conversations::get_conversation),
        )
}
