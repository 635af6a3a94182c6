//! Turns a run's raw output items into the messages and events returned to
//! the caller, tracking which agent holds the conversation afterwards.

use crate::agents::{AgentDefinition, AgentRegistry, RunItem};
use crate::tools::airline::{SEAT_MAP_DIRECTIVE, SEAT_MAP_TOOL};
use crate::types::{AgentEvent, EventKind, MessageResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Projection {
    pub messages: Vec<MessageResponse>,
    pub events: Vec<AgentEvent>,
    /// Target of the last handoff, or the starting agent if none occurred
    pub current_agent: Arc<AgentDefinition>,
}

/// Best-effort JSON parse of a tool argument payload; the raw string is kept on failure.
fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Project `items` in order. Events follow item order exactly.
pub fn project(
    items: &[RunItem],
    starting_agent: Arc<AgentDefinition>,
    registry: &AgentRegistry,
) -> Projection {
    let mut messages = Vec::new();
    let mut events = Vec::with_capacity(items.len());
    let mut current = starting_agent;

    for item in items {
        match item {
            RunItem::Message { agent, content } => {
                messages.push(MessageResponse {
                    content: content.clone(),
                    agent: agent.clone(),
                });
                events.push(AgentEvent::new(EventKind::Message, agent, content));
            }
            RunItem::Handoff {
                source_agent,
                target_agent,
            } => {
                let target = registry.resolve(target_agent);
                events.push(
                    AgentEvent::new(
                        EventKind::Handoff,
                        source_agent,
                        format!("{} -> {}", source_agent, target.name),
                    )
                    .with_metadata(json!({
                        "source_agent": source_agent,
                        "target_agent": target.name,
                    })),
                );

                let hook = registry
                    .get(source_agent)
                    .and_then(|source| source.handoff_to(&target.name).and_then(|h| h.on_handoff));
                if let Some(hook) = hook {
                    events.push(AgentEvent::new(EventKind::ToolCall, &target.name, hook.name));
                }

                debug!(source = %source_agent, target = %target.name, "Projected handoff");
                current = target;
            }
            RunItem::ToolCall {
                agent,
                name,
                arguments,
                ..
            } => {
                events.push(
                    AgentEvent::new(EventKind::ToolCall, agent, name)
                        .with_metadata(json!({ "tool_args": parse_arguments(arguments) })),
                );
                if name == SEAT_MAP_TOOL {
                    messages.push(MessageResponse {
                        content: SEAT_MAP_DIRECTIVE.to_string(),
                        agent: agent.clone(),
                    });
                }
            }
            RunItem::ToolOutput { agent, output, .. } => {
                events.push(
                    AgentEvent::new(EventKind::ToolOutput, agent, render(output))
                        .with_metadata(json!({ "tool_result": output })),
                );
            }
        }
    }

    Projection {
        messages,
        events,
        current_agent: current,
    }
}
