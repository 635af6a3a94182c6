//! The agent capability: one agent-driven run over a transcript.
//!
//! [`AgentRunner`] is the seam the turn orchestrator calls through.
//! [`LlmAgentRunner`] is the production implementation: a model tool-call loop
//! in which `transfer_to_<agent>` tools perform handoffs and every other tool
//! call is dispatched to the [`ToolRegistry`].

use crate::agents::{transfer_tool_name, AgentDefinition, AgentRegistry, AirlineAgentContext};
use crate::guardrails::OutputGuardrailOutcome;
use crate::llm::{CompletionRequest, LLMClient};
use crate::tools::ToolRegistry;
use crate::types::{AppError, TokenUsage, ToolDefinition, TranscriptItem};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One raw output item of a run, in the order it was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunItem {
    Message {
        agent: String,
        content: String,
    },
    Handoff {
        source_agent: String,
        target_agent: String,
    },
    ToolCall {
        agent: String,
        call_id: String,
        name: String,
        /// Raw argument payload as produced by the model
        arguments: String,
    },
    ToolOutput {
        agent: String,
        call_id: String,
        output: Value,
    },
}

/// Structured result of a run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub new_items: Vec<RunItem>,
    /// Input transcript plus everything appended during the run
    pub transcript: Vec<TranscriptItem>,
    /// Output guardrail verdicts, when the capability evaluated them itself
    pub output_guardrail_results: Option<Vec<OutputGuardrailOutcome>>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Input guardrail '{guardrail}' tripped: {reasoning}")]
    InputGuardrailTripped { guardrail: String, reasoning: String },

    #[error("Exceeded {0} model turns without a final reply")]
    MaxTurnsExceeded(usize),

    #[error("Model requested unknown tool '{0}'")]
    UnknownTool(String),

    #[error(transparent)]
    Llm(#[from] AppError),
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Llm(inner) => inner,
            other => AppError::LLM(other.to_string()),
        }
    }
}

/// Opaque agent capability consumed by the orchestrator.
///
/// `context` may be mutated by tools and handoff hooks during the run.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(
        &self,
        agent: &AgentDefinition,
        transcript: &[TranscriptItem],
        context: &mut AirlineAgentContext,
    ) -> Result<RunResult, RunError>;
}

/// LLM-backed agent runner
pub struct LlmAgentRunner {
    llm: Arc<dyn LLMClient>,
    registry: Arc<AgentRegistry>,
    tools: Arc<ToolRegistry>,
    max_turns: usize,
}

impl LlmAgentRunner {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        registry: Arc<AgentRegistry>,
        tools: Arc<ToolRegistry>,
        max_turns: usize,
    ) -> Self {
        Self {
            llm,
            registry,
            tools,
            max_turns,
        }
    }

    /// Domain tools plus one transfer tool per handoff edge.
    fn tool_definitions(&self, agent: &AgentDefinition) -> Vec<ToolDefinition> {
        let mut defs = self.tools.definitions_for(&agent.tools);
        for handoff in &agent.handoffs {
            let description = self
                .registry
                .get(&handoff.target)
                .map(|target| target.description.clone())
                .unwrap_or_default();
            defs.push(ToolDefinition {
                name: transfer_tool_name(&handoff.target),
                description: format!(
                    "Handoff to the {} to handle the request. {}",
                    handoff.target, description
                )
                .trim_end()
                .to_string(),
                parameters: json!({ "type": "object", "properties": {}, "required": [] }),
            });
        }
        defs
    }
}

fn render_output(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl AgentRunner for LlmAgentRunner {
    async fn run(
        &self,
        agent: &AgentDefinition,
        transcript: &[TranscriptItem],
        context: &mut AirlineAgentContext,
    ) -> Result<RunResult, RunError> {
        let mut active = self.registry.resolve(&agent.name);
        let mut transcript = transcript.to_vec();
        let mut new_items = Vec::new();
        let mut usage = TokenUsage::default();

        for turn in 0..self.max_turns {
            let request = CompletionRequest::new(active.instructions.render(context), transcript.clone())
                .with_tools(self.tool_definitions(&active));

            debug!(agent = %active.name, turn, "Requesting model turn");
            let response = self.llm.complete(request).await?;
            if let Some(u) = &response.usage {
                usage.add(u);
            }

            if response.tool_calls.is_empty() {
                transcript.push(TranscriptItem::assistant(&active.name, &response.content));
                new_items.push(RunItem::Message {
                    agent: active.name.clone(),
                    content: response.content,
                });
                info!(agent = %active.name, items = new_items.len(), "Run finished");
                return Ok(RunResult {
                    new_items,
                    transcript,
                    output_guardrail_results: None,
                    usage: Some(usage),
                });
            }

            if !response.content.trim().is_empty() {
                transcript.push(TranscriptItem::assistant(&active.name, &response.content));
                new_items.push(RunItem::Message {
                    agent: active.name.clone(),
                    content: response.content.clone(),
                });
            }

            for call in &response.tool_calls {
                transcript.push(TranscriptItem::ToolCall {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });
            }

            let mut next_agent = None;
            for call in response.tool_calls {
                if let Some(handoff) = active.handoff_for_tool(&call.name) {
                    if next_agent.is_some() {
                        warn!(agent = %active.name, tool = %call.name, "Ignoring extra handoff in the same model turn");
                        transcript.push(TranscriptItem::ToolResult {
                            call_id: call.id,
                            output: "Multiple handoffs detected, ignoring this one.".to_string(),
                        });
                        continue;
                    }

                    let target = self.registry.resolve(&handoff.target);
                    if let Some(hook) = handoff.on_handoff {
                        debug!(hook = hook.name, "Running handoff hook");
                        (hook.apply)(context);
                    }
                    info!(source = %active.name, target = %target.name, "Handoff");
                    new_items.push(RunItem::Handoff {
                        source_agent: active.name.clone(),
                        target_agent: target.name.clone(),
                    });
                    transcript.push(TranscriptItem::ToolResult {
                        call_id: call.id,
                        output: json!({ "assistant": target.name }).to_string(),
                    });
                    next_agent = Some(target);
                    continue;
                }

                if !active.tools.contains(&call.name) {
                    return Err(RunError::UnknownTool(call.name));
                }

                new_items.push(RunItem::ToolCall {
                    agent: active.name.clone(),
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });

                let args: Value = serde_json::from_str(&call.arguments).unwrap_or_else(|_| json!({}));
                let output = match self.tools.execute(&call.name, args, context).await {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(agent = %active.name, tool = %call.name, error = %e, "Tool failed");
                        json!({ "error": e.to_string() })
                    }
                };

                transcript.push(TranscriptItem::ToolResult {
                    call_id: call.id.clone(),
                    output: render_output(&output),
                });
                new_items.push(RunItem::ToolOutput {
                    agent: active.name.clone(),
                    call_id: call.id,
                    output,
                });
            }

            if let Some(next) = next_agent {
                active = next;
            }
        }

        Err(RunError::MaxTurnsExceeded(self.max_turns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_output_unwraps_strings() {
        assert_eq!(render_output(&json!("on time")), "on time");
        assert_eq!(render_output(&json!({"error": "x"})), r#"{"error":"x"}"#);
    }

    #[test]
    fn test_run_error_converts_to_llm_app_error() {
        let err: AppError = RunError::MaxTurnsExceeded(3).into();
        assert!(matches!(err, AppError::LLM(msg) if msg.contains('3')));

        let err: AppError = RunError::Llm(AppError::LLM("timeout".into())).into();
        assert!(matches!(err, AppError::LLM(msg) if msg == "timeout"));
    }
}
