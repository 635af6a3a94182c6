//! # Aerodesk - multi-agent airline customer service
//!
//! A conversation server in which a triage agent hands customers off to
//! specialist agents (FAQ, seat booking, flight status, cancellation). Every
//! turn passes through input guardrails before the model runs and output
//! guardrails after it, and the resulting transcript, shared context and
//! active agent are persisted per conversation.
//!
//! Aerodesk can be used in two ways:
//!
//! 1. **As a standalone server** - run the `aerodesk-server` binary
//! 2. **As a library** - embed the [`TurnOrchestrator`] with your own
//!    [`AgentRunner`], guardrails and [`ConversationStore`]
//!
//! ## Library usage
//!
//! ```rust,ignore
//! use aerodesk::{
//!     agents::airline::airline_registry, guardrails::GuardrailSet, store::InMemoryConversationStore,
//!     ChatRequest, OrchestratorSettings, TurnOrchestrator,
//! };
//! use std::sync::Arc;
//!
//! let registry = Arc::new(airline_registry(&GuardrailSet::new())?);
//! let orchestrator = TurnOrchestrator::new(
//!     registry,
//!     my_runner,
//!     Arc::new(InMemoryConversationStore::new()),
//!     OrchestratorSettings::default(),
//! );
//! let response = orchestrator.handle_turn(ChatRequest::new("I want to change my seat")).await?;
//! println!("{} -> {:?}", response.current_agent, response.messages);
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - agent definitions, registry, runner, projector and the turn orchestrator
//! - [`guardrails`] - input/output guardrails and the pipeline that runs them
//! - [`store`] - conversation persistence and per-conversation locking
//! - [`llm`] - OpenAI-compatible model client
//! - [`tools`] - airline domain tools
//! - [`api`] - HTTP routes and handlers
//! - [`types`] - request/response types and errors

/// Agents, registry, runner, projector and the turn orchestrator.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Wiring from configuration to a running application.
pub mod bootstrap;
/// Command-line interface.
pub mod cli;
/// Input and output guardrails.
pub mod guardrails;
/// LLM client abstraction and the OpenAI-compatible client.
pub mod llm;
/// Conversation persistence.
pub mod store;
/// Airline domain tools.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and text utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{
    AgentRegistry, AgentRegistryBuilder, AgentRunner, AirlineAgentContext, LlmAgentRunner,
    OrchestratorSettings, TurnOrchestrator,
};
pub use llm::{LLMClient, LLMResponse, OpenAIClient};
pub use store::{ConversationState, ConversationStore, FileConversationStore, InMemoryConversationStore};
pub use tools::ToolRegistry;
pub use types::{AppError, ChatRequest, ChatResponse, Result};
pub use utils::toml_config::AerodeskConfig;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Validated configuration the server was started with
    pub config: Arc<AerodeskConfig>,
    /// Agent registry, shared with the orchestrator
    pub registry: Arc<AgentRegistry>,
    /// Turn orchestrator
    pub orchestrator: Arc<TurnOrchestrator>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(config: Arc<AerodeskConfig>, orchestrator: Arc<TurnOrchestrator>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            registry: orchestrator.registry().clone(),
            orchestrator,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Signal in-flight turns to abort.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`begin_shutdown`](Self::begin_shutdown) has been called.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            if rx.wait_for(|stopping| *stopping).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
