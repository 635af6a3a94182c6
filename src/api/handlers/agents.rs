use crate::{types::AgentInfo, AppState};
use axum::{extract::State, Json};

/// List every registered agent in registration order.
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    Json(state.registry.agent_infos())
}
