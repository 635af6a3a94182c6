//! Read-only view of stored conversations.

use crate::{
    store::ConversationState,
    types::{AppError, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Return the stored state of a conversation: transcript, context and current agent.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationState>> {
    state
        .orchestrator
        .conversation(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Conversation {} not found", id)))
}
