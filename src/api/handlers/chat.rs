use crate::{
    types::{ChatRequest, ChatResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Run one conversation turn.
///
/// The turn is aborted with 408 if the server starts shutting down first.
/// A client that disconnects drops the turn; nothing is persisted either way.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let response = state
        .orchestrator
        .handle_turn_or_cancel(payload, state.shutdown_signal())
        .await?;
    Ok(Json(response))
}
