pub mod airline;
pub mod context;
pub mod orchestrator;
pub mod projector;
pub mod registry;
pub mod runner;

use crate::guardrails::{InputGuardrail, OutputGuardrail};
use crate::types::AgentInfo;
use std::fmt;
use std::sync::Arc;

// Re-export commonly used types
pub use context::AirlineAgentContext;
pub use orchestrator::{OrchestratorSettings, TurnOrchestrator, TurnStage};
pub use registry::{AgentRegistry, AgentRegistryBuilder};
pub use runner::{AgentRunner, LlmAgentRunner, RunError, RunItem, RunResult};

/// Renders an agent's instructions against the live context.
pub type InstructionsFn = fn(&AirlineAgentContext) -> String;

#[derive(Clone)]
pub enum Instructions {
    Static(String),
    Dynamic(InstructionsFn),
}

impl Instructions {
    pub fn render(&self, context: &AirlineAgentContext) -> String {
        match self {
            Instructions::Static(text) => text.clone(),
            Instructions::Dynamic(render) => render(context),
        }
    }
}

impl fmt::Debug for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instructions::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Instructions::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Side effect run on the context when control moves along a handoff edge.
#[derive(Clone, Copy)]
pub struct HandoffHook {
    pub name: &'static str,
    pub apply: fn(&mut AirlineAgentContext),
}

impl fmt::Debug for HandoffHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffHook")
            .field("name", &self.name)
            .finish()
    }
}

/// Directed edge of the handoff graph. Targets are resolved by name.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub target: String,
    pub on_handoff: Option<HandoffHook>,
}

impl Handoff {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            on_handoff: None,
        }
    }

    pub fn with_hook(mut self, hook: HandoffHook) -> Self {
        self.on_handoff = Some(hook);
        self
    }

    /// Tool name offered to the model for this edge, e.g. `transfer_to_faq_agent`.
    pub fn tool_name(&self) -> String {
        transfer_tool_name(&self.target)
    }
}

pub fn transfer_tool_name(agent_name: &str) -> String {
    let snake: String = agent_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("transfer_to_{}", snake)
}

/// A named, instructable agent. Immutable once registered.
#[derive(Clone)]
pub struct AgentDefinition {
    pub name: String,
    /// Short description shown to the UI and to agents handing off here
    pub description: String,
    pub instructions: Instructions,
    pub tools: Vec<String>,
    pub handoffs: Vec<Handoff>,
    pub input_guardrails: Vec<Arc<dyn InputGuardrail>>,
    pub output_guardrails: Vec<Arc<dyn OutputGuardrail>>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instructions: Instructions) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions,
            tools: Vec::new(),
            handoffs: Vec::new(),
            input_guardrails: Vec::new(),
            output_guardrails: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(tool.into());
        self
    }

    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoffs.push(handoff);
        self
    }

    pub fn with_input_guardrail(mut self, guardrail: Arc<dyn InputGuardrail>) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    pub fn with_output_guardrail(mut self, guardrail: Arc<dyn OutputGuardrail>) -> Self {
        self.output_guardrails.push(guardrail);
        self
    }

    /// Edge from this agent to `target`, if one is declared.
    pub fn handoff_to(&self, target: &str) -> Option<&Handoff> {
        self.handoffs.iter().find(|h| h.target == target)
    }

    /// Edge whose transfer tool is named `tool_name`.
    pub fn handoff_for_tool(&self, tool_name: &str) -> Option<&Handoff> {
        self.handoffs.iter().find(|h| h.tool_name() == tool_name)
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            handoffs: self.handoffs.iter().map(|h| h.target.clone()).collect(),
            tools: self.tools.clone(),
            input_guardrails: self
                .input_guardrails
                .iter()
                .map(|g| g.name().to_string())
                .collect(),
            output_guardrails: self
                .output_guardrails
                .iter()
                .map(|g| g.name().to_string())
                .collect(),
        }
    }
}

impl fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        f.debug_struct("AgentDefinition")
            .field("name", &info.name)
            .field("tools", &info.tools)
            .field("handoffs", &info.handoffs)
            .field("input_guardrails", &info.input_guardrails)
            .field("output_guardrails", &info.output_guardrails)
            .finish()
    }
}
