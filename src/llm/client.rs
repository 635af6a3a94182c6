//! LLM client abstraction
//!
//! The orchestrator never talks to a model directly; the agent runner and the
//! model-backed guardrails do, through [`LLMClient`]. Anything that speaks the
//! chat-completions shape can sit behind it.

use crate::types::{Result, TokenUsage, ToolCall, ToolDefinition, TranscriptItem};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Run one chat completion round-trip
    async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// A single completion request: system prompt, replayed transcript and offered tools.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<TranscriptItem>,
    pub tools: Vec<ToolDefinition>,
    /// Ask the model for a JSON object reply
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, messages: Vec<TranscriptItem>) -> Self {
        Self {
            system: system.into(),
            messages,
            ..Self::default()
        }
    }

    /// Single user message judged against `system`, answered as JSON.
    pub fn json(system: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: vec![TranscriptItem::user(text)],
            tools: Vec::new(),
            json_output: true,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Response from an LLM generation request
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: "stop".to_string(),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            finish_reason: "tool_calls".to_string(),
            ..Self::default()
        }
    }
}
