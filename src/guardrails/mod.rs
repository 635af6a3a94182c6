//! Input and output guardrails.
//!
//! Input guardrails run before the agent capability and may trip, which turns
//! the turn into a scripted refusal. Output guardrails run after generation,
//! never block, and may offer a rewrite of the final assistant message.
//!
//! - [`pipeline`] - ordering, tripwire and audit-record policy
//! - [`llm`] - model-backed relevance, jailbreak and tone-of-voice checks
//! - [`plain_text`] - deterministic markdown/HTML stripping

pub mod llm;
pub mod pipeline;
pub mod plain_text;

use crate::agents::AirlineAgentContext;
use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use llm::{JailbreakGuardrail, RelevanceGuardrail, ToneOfVoiceGuardrail};
pub use pipeline::{InputGuardrailMode, InputPhase, OutputGuardrailOutcome, TrippedGuardrail};
pub use plain_text::PlainTextGuardrail;

/// Verdict of an input guardrail on the newest user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputVerdict {
    pub triggered: bool,
    pub reasoning: String,
}

impl InputVerdict {
    pub fn pass(reasoning: impl Into<String>) -> Self {
        Self {
            triggered: false,
            reasoning: reasoning.into(),
        }
    }

    pub fn trip(reasoning: impl Into<String>) -> Self {
        Self {
            triggered: true,
            reasoning: reasoning.into(),
        }
    }
}

/// Verdict of an output guardrail on the candidate reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputVerdict {
    pub triggered: bool,
    pub reasoning: String,
    pub rewritten_text: Option<String>,
}

impl OutputVerdict {
    pub fn unchanged(reasoning: impl Into<String>) -> Self {
        Self {
            triggered: false,
            reasoning: reasoning.into(),
            rewritten_text: None,
        }
    }

    pub fn rewrite(text: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            triggered: false,
            reasoning: reasoning.into(),
            rewritten_text: Some(text.into()),
        }
    }
}

#[async_trait]
pub trait InputGuardrail: Send + Sync {
    fn name(&self) -> &str;

    /// Judge only `input`, the latest user message.
    async fn check(&self, context: &AirlineAgentContext, input: &str) -> Result<InputVerdict>;
}

#[async_trait]
pub trait OutputGuardrail: Send + Sync {
    fn name(&self) -> &str;

    async fn review(&self, context: &AirlineAgentContext, text: &str) -> Result<OutputVerdict>;
}

/// Guardrails attached to every agent of a registry.
#[derive(Clone, Default)]
pub struct GuardrailSet {
    pub input: Vec<Arc<dyn InputGuardrail>>,
    pub output: Vec<Arc<dyn OutputGuardrail>>,
}

impl GuardrailSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, guardrail: Arc<dyn InputGuardrail>) -> Self {
        self.input.push(guardrail);
        self
    }

    pub fn with_output(mut self, guardrail: Arc<dyn OutputGuardrail>) -> Self {
        self.output.push(guardrail);
        self
    }
}
