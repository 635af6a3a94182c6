//! Test doubles shared by the integration tests.
//!
//! - [`MockLLMClient`] replays a script of model responses and records requests
//! - [`ScriptedRunner`] stands in for the agent capability
//! - static and failing guardrails with fixed verdicts

use aerodesk::agents::airline::airline_registry;
use aerodesk::agents::{AgentDefinition, AgentRegistry, AirlineAgentContext, AgentRunner};
use aerodesk::agents::{RunError, RunItem, RunResult};
use aerodesk::guardrails::{
    GuardrailSet, InputGuardrail, InputVerdict, OutputGuardrail, OutputVerdict,
};
use aerodesk::llm::{CompletionRequest, LLMClient, LLMResponse};
use aerodesk::store::{ConversationState, ConversationStore, InMemoryConversationStore};
use aerodesk::types::{AppError, Result, ToolCall, TranscriptItem};
use aerodesk::{OrchestratorSettings, TurnOrchestrator};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============= LLM =============

/// Mock LLM client that returns scripted responses in order.
///
/// Once the script runs out it keeps returning the last response.
pub struct MockLLMClient {
    script: Mutex<VecDeque<LLMResponse>>,
    last: Mutex<Option<LLMResponse>>,
    should_fail: bool,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLLMClient {
    pub fn scripted(responses: Vec<LLMResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(None),
            should_fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn new(reply: &str) -> Arc<Self> {
        Self::scripted(vec![LLMResponse::text(reply)])
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            should_fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse> {
        self.requests.lock().push(request);
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(response) = next {
            *last = Some(response);
        }
        last.clone()
            .ok_or_else(|| AppError::LLM("Mock LLM has no scripted response".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

// ============= Agent capability =============

#[derive(Clone)]
pub enum RunOutcome {
    Complete,
    Trip { guardrail: String, reasoning: String },
    Fail(String),
    Hang,
}

/// Agent capability returning fixed items. The canonical transcript is the
/// input transcript plus one assistant entry per message item.
pub struct ScriptedRunner {
    items: Vec<RunItem>,
    edit: Option<fn(&mut AirlineAgentContext)>,
    outcome: RunOutcome,
    delay: Option<Duration>,
    gate: Option<Arc<tokio::sync::Barrier>>,
    pub calls: AtomicUsize,
    pub seen_agents: Mutex<Vec<String>>,
    pub seen_transcripts: Mutex<Vec<Vec<TranscriptItem>>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(items: Vec<RunItem>) -> Self {
        Self {
            items,
            edit: None,
            outcome: RunOutcome::Complete,
            delay: None,
            gate: None,
            calls: AtomicUsize::new(0),
            seen_agents: Mutex::new(Vec::new()),
            seen_transcripts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Runner that answers with a single message from `agent`.
    pub fn replying(agent: &str, content: &str) -> Self {
        Self::new(vec![message(agent, content)])
    }

    pub fn with_context_edit(mut self, edit: fn(&mut AirlineAgentContext)) -> Self {
        self.edit = Some(edit);
        self
    }

    pub fn with_outcome(mut self, outcome: RunOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every run waits on `gate` before completing.
    pub fn with_gate(mut self, gate: Arc<tokio::sync::Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentRunner for ScriptedRunner {
    async fn run(
        &self,
        agent: &AgentDefinition,
        transcript: &[TranscriptItem],
        context: &mut AirlineAgentContext,
    ) -> std::result::Result<RunResult, RunError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_agents.lock().push(agent.name.clone());
        self.seen_transcripts.lock().push(transcript.to_vec());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(edit) = self.edit {
            edit(context);
        }

        match &self.outcome {
            RunOutcome::Complete => {}
            RunOutcome::Trip {
                guardrail,
                reasoning,
            } => {
                return Err(RunError::InputGuardrailTripped {
                    guardrail: guardrail.clone(),
                    reasoning: reasoning.clone(),
                })
            }
            RunOutcome::Fail(message) => {
                return Err(RunError::Llm(AppError::LLM(message.clone())))
            }
            RunOutcome::Hang => std::future::pending::<()>().await,
        }

        let mut canonical = transcript.to_vec();
        for item in &self.items {
            if let RunItem::Message { agent, content } = item {
                canonical.push(TranscriptItem::assistant(agent, content));
            }
        }

        Ok(RunResult {
            new_items: self.items.clone(),
            transcript: canonical,
            output_guardrail_results: None,
            usage: None,
        })
    }
}

pub fn message(agent: &str, content: &str) -> RunItem {
    RunItem::Message {
        agent: agent.to_string(),
        content: content.to_string(),
    }
}

pub fn handoff(source: &str, target: &str) -> RunItem {
    RunItem::Handoff {
        source_agent: source.to_string(),
        target_agent: target.to_string(),
    }
}

// ============= Guardrails =============

/// Input guardrail with a fixed verdict.
pub struct StaticInputGuardrail {
    pub name: &'static str,
    pub trip: bool,
    pub calls: AtomicUsize,
}

impl StaticInputGuardrail {
    pub fn passing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            trip: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn tripping(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            trip: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl InputGuardrail for StaticInputGuardrail {
    fn name(&self) -> &str {
        self.name
    }

    async fn check(&self, _context: &AirlineAgentContext, input: &str) -> Result<InputVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.trip {
            Ok(InputVerdict::trip(format!("'{}' is off-topic", input)))
        } else {
            Ok(InputVerdict::pass("on-topic"))
        }
    }
}

/// Output guardrail with a fixed verdict.
pub struct StaticOutputGuardrail {
    pub name: &'static str,
    pub rewrite: Option<&'static str>,
}

impl StaticOutputGuardrail {
    pub fn silent(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            rewrite: None,
        })
    }

    pub fn rewriting(name: &'static str, text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            rewrite: Some(text),
        })
    }
}

#[async_trait]
impl OutputGuardrail for StaticOutputGuardrail {
    fn name(&self) -> &str {
        self.name
    }

    async fn review(&self, _context: &AirlineAgentContext, _text: &str) -> Result<OutputVerdict> {
        Ok(match self.rewrite {
            Some(text) => OutputVerdict::rewrite(text, "rewritten"),
            None => OutputVerdict::unchanged("looks fine"),
        })
    }
}

/// Output guardrail whose evaluation always errors.
pub struct FailingOutputGuardrail;

#[async_trait]
impl OutputGuardrail for FailingOutputGuardrail {
    fn name(&self) -> &str {
        "Failing Guardrail"
    }

    async fn review(&self, _context: &AirlineAgentContext, _text: &str) -> Result<OutputVerdict> {
        Err(AppError::LLM("judge returned malformed JSON".to_string()))
    }
}

// ============= Store =============

/// In-memory store whose writes take `delay` to land.
pub struct SlowStore {
    pub inner: InMemoryConversationStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryConversationStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl ConversationStore for SlowStore {
    async fn get(&self, id: &str) -> Result<Option<ConversationState>> {
        self.inner.get(id).await
    }

    async fn save(&self, id: &str, state: &ConversationState) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.save(id, state).await
    }
}

// ============= Assembly =============

pub fn registry(guardrails: &GuardrailSet) -> Arc<AgentRegistry> {
    Arc::new(airline_registry(guardrails).unwrap())
}

pub fn orchestrator(
    guardrails: &GuardrailSet,
    runner: Arc<dyn AgentRunner>,
) -> (TurnOrchestrator, Arc<InMemoryConversationStore>) {
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = TurnOrchestrator::new(
        registry(guardrails),
        runner,
        store.clone() as Arc<dyn ConversationStore>,
        OrchestratorSettings::default(),
    );
    (orchestrator, store)
}
