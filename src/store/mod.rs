//! Conversation persistence.
//!
//! The orchestrator only sees [`ConversationStore`]; which backend sits behind
//! it is decided at startup from `[store]` in the config file.

pub mod file;
pub mod locks;

use crate::agents::AirlineAgentContext;
use crate::types::{Result, TranscriptItem};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use file::FileConversationStore;
pub use locks::ConversationLocks;

/// Everything remembered about one conversation between turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: String,
    /// Canonical transcript as last returned by the agent capability
    pub transcript: Vec<TranscriptItem>,
    pub context: AirlineAgentContext,
    pub current_agent_name: String,
}

impl ConversationState {
    /// Fresh state with a newly generated context.
    pub fn new(id: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: Vec::new(),
            context: AirlineAgentContext::new(),
            current_agent_name: agent.into(),
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<ConversationState>>;

    /// Overwrites any previous state stored under `id`.
    async fn save(&self, id: &str, state: &ConversationState) -> Result<()>;
}

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conversations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.read().is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, id: &str) -> Result<Option<ConversationState>> {
        Ok(self.conversations.read().get(id).cloned())
    }

    async fn save(&self, id: &str, state: &ConversationState) -> Result<()> {
        self.conversations
            .write()
            .insert(id.to_string(), state.clone());
        Ok(())
    }
}
