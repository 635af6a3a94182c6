//! Wiring from a validated [`AerodeskConfig`] to a ready [`AppState`].

use crate::agents::airline::airline_registry;
use crate::agents::{AgentRegistry, LlmAgentRunner, TurnOrchestrator};
use crate::guardrails::{
    GuardrailSet, JailbreakGuardrail, PlainTextGuardrail, RelevanceGuardrail, ToneOfVoiceGuardrail,
};
use crate::llm::{LLMClient, OpenAIClient};
use crate::store::{ConversationStore, FileConversationStore, InMemoryConversationStore};
use crate::tools::ToolRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{AerodeskConfig, StoreBackend};
use crate::AppState;
use std::sync::Arc;
use tracing::{info, warn};

/// Guardrails attached to every airline agent.
///
/// Plain-text cleanup sits after tone of voice, so it only rewrites when the
/// tone guardrail produced nothing (for example when its judge call failed).
pub fn airline_guardrails(guardrail_llm: Arc<dyn LLMClient>) -> GuardrailSet {
    GuardrailSet::new()
        .with_input(Arc::new(RelevanceGuardrail::new(guardrail_llm.clone())))
        .with_input(Arc::new(JailbreakGuardrail::new(guardrail_llm.clone())))
        .with_output(Arc::new(ToneOfVoiceGuardrail::new(guardrail_llm)))
        .with_output(Arc::new(PlainTextGuardrail))
}

/// Airline registry whose guardrails use the configured guardrail model.
pub fn build_registry(config: &AerodeskConfig) -> Result<AgentRegistry> {
    let guardrail_llm: Arc<dyn LLMClient> =
        Arc::new(OpenAIClient::new(config.llm.guardrail_client())?);
    airline_registry(&airline_guardrails(guardrail_llm))
}

/// Conversation store selected by `[store]`.
pub async fn build_store(config: &AerodeskConfig) -> Result<Arc<dyn ConversationStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory conversation store");
            Ok(Arc::new(InMemoryConversationStore::new()))
        }
        StoreBackend::File => {
            let path = config.store.path.as_ref().ok_or_else(|| {
                AppError::Configuration("store.path is required for the file backend".into())
            })?;
            let store = FileConversationStore::open(path).await?;
            info!(path = %store.root().display(), "Using file conversation store");
            Ok(Arc::new(store))
        }
    }
}

/// Build the whole application from configuration.
pub async fn build_state(config: AerodeskConfig) -> Result<AppState> {
    if config.llm.api_key().is_none() {
        warn!(
            env = %config.llm.api_key_env,
            "No API key found; model requests will be sent unauthenticated"
        );
    }

    let registry = Arc::new(build_registry(&config)?);
    let agent_llm: Arc<dyn LLMClient> = Arc::new(OpenAIClient::new(config.llm.agent_client())?);
    let runner = Arc::new(LlmAgentRunner::new(
        agent_llm,
        registry.clone(),
        Arc::new(ToolRegistry::with_airline_tools()),
        config.llm.max_turns,
    ));
    let store = build_store(&config).await?;

    let orchestrator = Arc::new(TurnOrchestrator::new(
        registry.clone(),
        runner,
        store,
        config.orchestrator.settings(),
    ));

    info!(
        agents = registry.len(),
        model = %config.llm.model,
        guardrail_model = %config.llm.guardrail_model,
        "Application bootstrapped"
    );
    Ok(AppState::new(Arc::new(config), orchestrator))
}
