//! Turn orchestrator
//!
//! One call to [`TurnOrchestrator::handle_turn`] processes one user message:
//!
//! ```text
//! Idle -> InputGuardrail -> Refused ----------------------------------------> Done
//!                        \-> Generating -> Projecting -> OutputGuardrail -> Persisting -> Done
//! ```
//!
//! Turns on the same conversation id are serialized through
//! [`ConversationLocks`]. The agent capability works on a private copy of the
//! context and the store is written only while `Persisting`, so a turn that
//! fails or is dropped before then leaves the stored conversation untouched.
//! `Persisting` itself runs on a spawned task and always finishes.

use crate::agents::projector::project;
use crate::agents::{AgentDefinition, AgentRegistry, AgentRunner, RunError};
use crate::guardrails::pipeline::{
    final_input_checks, run_input_guardrails, run_output_guardrails, tripwire_checks,
    InputGuardrailMode,
};
use crate::store::{ConversationLocks, ConversationState, ConversationStore};
use crate::types::{
    new_id, AgentEvent, AppError, ChatRequest, ChatResponse, EventKind, GuardrailCheck,
    MessageResponse, OutputGuardrailCheck, Result, TokenUsage, TranscriptItem,
};
use crate::utils::toml_config::default_refusal_message;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Idle,
    InputGuardrail,
    Refused,
    Generating,
    Projecting,
    OutputGuardrail,
    Persisting,
    Done,
}

impl TurnStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStage::Idle => "idle",
            TurnStage::InputGuardrail => "input_guardrail",
            TurnStage::Refused => "refused",
            TurnStage::Generating => "generating",
            TurnStage::Projecting => "projecting",
            TurnStage::OutputGuardrail => "output_guardrail",
            TurnStage::Persisting => "persisting",
            TurnStage::Done => "done",
        }
    }
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Assistant reply used when an input guardrail trips
    pub refusal_message: String,
    pub input_guardrail_mode: InputGuardrailMode,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            refusal_message: default_refusal_message(),
            input_guardrail_mode: InputGuardrailMode::default(),
        }
    }
}

pub struct TurnOrchestrator {
    registry: Arc<AgentRegistry>,
    runner: Arc<dyn AgentRunner>,
    store: Arc<dyn ConversationStore>,
    locks: ConversationLocks,
    settings: OrchestratorSettings,
}

/// A turn that has passed every stage but `Persisting`, still holding its
/// conversation lock.
struct PendingTurn {
    guard: OwnedMutexGuard<()>,
    state: ConversationState,
    response: ChatResponse,
    usage: Option<TokenUsage>,
}

impl PendingTurn {
    fn new(guard: OwnedMutexGuard<()>, state: ConversationState, response: ChatResponse) -> Self {
        Self {
            guard,
            state,
            response,
            usage: None,
        }
    }
}

fn enter(conversation_id: &str, stage: TurnStage) {
    debug!(conversation_id = %conversation_id, stage = %stage, "Turn stage");
}

impl TurnOrchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        runner: Arc<dyn AgentRunner>,
        store: Arc<dyn ConversationStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            runner,
            store,
            locks: ConversationLocks::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Run [`handle_turn`](Self::handle_turn) until `cancel` resolves.
    ///
    /// `cancel` only races the stages before `Persisting`. A cancelled turn
    /// persists nothing and fails with [`AppError::Cancelled`]; once a turn
    /// reaches `Persisting` it is saved and answered regardless of `cancel`.
    pub async fn handle_turn_or_cancel<F>(
        &self,
        request: ChatRequest,
        cancel: F,
    ) -> Result<ChatResponse>
    where
        F: Future<Output = ()>,
    {
        let pending = tokio::select! {
            biased;
            _ = cancel => {
                info!("Turn cancelled before completion");
                return Err(AppError::Cancelled("turn aborted before completion".to_string()));
            }
            pending = self.prepare(request) => pending?,
        };
        self.commit(pending).await
    }

    /// Process one inbound user message.
    pub async fn handle_turn(&self, request: ChatRequest) -> Result<ChatResponse> {
        let pending = self.prepare(request).await?;
        self.commit(pending).await
    }

    /// Every stage up to `Persisting`. Touches no stored state, so dropping
    /// the future at any await point is harmless.
    async fn prepare(&self, request: ChatRequest) -> Result<PendingTurn> {
        let requested = request
            .conversation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        // Lock before load so the whole read-modify-write is exclusive.
        let mut existing = None;
        let mut guard = None;
        if let Some(id) = requested {
            let held = self.locks.acquire(id).await;
            existing = self.store.get(id).await?;
            if existing.is_some() {
                guard = Some(held);
            }
        }

        let (mut state, is_new) = match existing {
            Some(state) => (state, false),
            None => (
                ConversationState::new(new_id(), self.registry.default_agent().name.clone()),
                true,
            ),
        };
        let guard = match guard {
            Some(held) => held,
            None => self.locks.acquire(&state.id).await,
        };
        let conversation_id = state.id.clone();
        enter(&conversation_id, TurnStage::Idle);

        let agent = self.registry.resolve(&state.current_agent_name);
        if agent.name != state.current_agent_name {
            state.current_agent_name = agent.name.clone();
        }

        if is_new && request.message.trim().is_empty() {
            info!(conversation_id = %conversation_id, "Starting empty conversation");
            let response = self.response(&state, Vec::new(), Vec::new(), Vec::new(), Vec::new());
            return Ok(PendingTurn::new(guard, state, response));
        }

        let message = request.message;
        let mut transcript = state.transcript.clone();
        transcript.push(TranscriptItem::user(&message));
        let before = state.context.clone();

        enter(&conversation_id, TurnStage::InputGuardrail);
        let input_phase = run_input_guardrails(
            &agent,
            &state.context,
            &message,
            self.settings.input_guardrail_mode,
        )
        .await?;
        if input_phase.tripped.is_some() {
            return Ok(self.refuse(guard, state, transcript, &agent, input_phase.checks));
        }

        enter(&conversation_id, TurnStage::Generating);
        let mut context = before.clone();
        let run = match self.runner.run(&agent, &transcript, &mut context).await {
            Ok(run) => run,
            Err(RunError::InputGuardrailTripped {
                guardrail,
                reasoning,
            }) => {
                info!(
                    conversation_id = %conversation_id,
                    guardrail = %guardrail,
                    "Agent capability reported input guardrail trip"
                );
                let checks = tripwire_checks(&agent, &guardrail, &reasoning, &message);
                return Ok(self.refuse(guard, state, transcript, &agent, checks));
            }
            Err(e) => {
                error!(conversation_id = %conversation_id, agent = %agent.name, error = %e, "Agent run failed");
                return Err(e.into());
            }
        };

        enter(&conversation_id, TurnStage::Projecting);
        let projection = project(&run.new_items, agent.clone(), &self.registry);
        let current = projection.current_agent;
        let mut messages = projection.messages;
        let mut events = projection.events;

        enter(&conversation_id, TurnStage::OutputGuardrail);
        let output_checks = run_output_guardrails(
            &current,
            &context,
            &mut messages,
            run.output_guardrail_results,
        )
        .await;

        let changed = context.changed_fields(&before);
        if !changed.is_empty() {
            debug!(conversation_id = %conversation_id, fields = ?changed.keys().collect::<Vec<_>>(), "Context changed");
            events.push(
                AgentEvent::new(EventKind::ContextUpdate, &current.name, "")
                    .with_metadata(Value::Object(changed)),
            );
        }

        state.transcript = run.transcript;
        state.context = context;
        state.current_agent_name = current.name.clone();
        let input_checks = final_input_checks(&current, &input_phase.checks, &message);
        let response = self.response(&state, messages, events, input_checks, output_checks);
        let mut pending = PendingTurn::new(guard, state, response);
        pending.usage = run.usage;
        Ok(pending)
    }

    /// `Persisting`. The save runs on its own task together with the
    /// conversation lock, so it completes and releases the lock even when
    /// the caller stops waiting.
    async fn commit(&self, pending: PendingTurn) -> Result<ChatResponse> {
        let PendingTurn {
            guard,
            state,
            response,
            usage,
        } = pending;
        let conversation_id = state.id.clone();
        enter(&conversation_id, TurnStage::Persisting);

        let store = Arc::clone(&self.store);
        let saving = tokio::spawn(async move {
            let saved = store.save(&state.id, &state).await;
            drop(guard);
            saved
        });
        match saving.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(conversation_id = %conversation_id, error = %e, "Failed to persist turn");
                return Err(e);
            }
            Err(e) => {
                error!(conversation_id = %conversation_id, error = %e, "Persist task failed");
                return Err(AppError::Internal(format!(
                    "persisting conversation {} failed: {}",
                    conversation_id, e
                )));
            }
        }

        enter(&conversation_id, TurnStage::Done);
        let usage = usage.unwrap_or_default();
        info!(
            conversation_id = %conversation_id,
            agent = %response.current_agent,
            messages = response.messages.len(),
            events = response.events.len(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Turn complete"
        );
        Ok(response)
    }

    /// Scripted refusal turn: records the user message and the refusal, leaves
    /// the agent and context untouched and runs no output guardrails.
    fn refuse(
        &self,
        guard: OwnedMutexGuard<()>,
        mut state: ConversationState,
        mut transcript: Vec<TranscriptItem>,
        agent: &AgentDefinition,
        checks: Vec<GuardrailCheck>,
    ) -> PendingTurn {
        enter(&state.id, TurnStage::Refused);
        let refusal = self.settings.refusal_message.clone();
        transcript.push(TranscriptItem::assistant(&agent.name, &refusal));
        state.transcript = transcript;
        info!(conversation_id = %state.id, agent = %agent.name, "Turn refused by input guardrail");

        let messages = vec![MessageResponse {
            content: refusal,
            agent: agent.name.clone(),
        }];
        let response = self.response(&state, messages, Vec::new(), checks, Vec::new());
        PendingTurn::new(guard, state, response)
    }

    fn response(
        &self,
        state: &ConversationState,
        messages: Vec<MessageResponse>,
        events: Vec<AgentEvent>,
        guardrails: Vec<GuardrailCheck>,
        output_guardrails: Vec<OutputGuardrailCheck>,
    ) -> ChatResponse {
        ChatResponse {
            conversation_id: state.id.clone(),
            current_agent: state.current_agent_name.clone(),
            messages,
            events,
            context: state.context.to_value(),
            agents: self.registry.agent_infos(),
            guardrails,
            output_guardrails,
        }
    }

    /// Stored state for `id`, if any.
    pub async fn conversation(&self, id: &str) -> Result<Option<ConversationState>> {
        self.store.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(TurnStage::InputGuardrail.to_string(), "input_guardrail");
        assert_eq!(TurnStage::Done.as_str(), "done");
    }

    #[test]
    fn test_default_settings() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.input_guardrail_mode, InputGuardrailMode::FirstTrip);
        assert!(settings.refusal_message.contains("airline travel"));
    }
}
