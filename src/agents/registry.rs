//! Agent Registry
//!
//! Immutable table of agent definitions keyed by name, plus the default
//! ("triage") agent used whenever a name no longer resolves. Handoff edges
//! are stored by target name and validated once at build time, so cyclic
//! graphs (every specialist hands back to triage) need no special handling.

use crate::agents::AgentDefinition;
use crate::types::{AgentInfo, AppError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of agent definitions
pub struct AgentRegistry {
    agents: HashMap<String, Arc<AgentDefinition>>,
    /// Registration order, used for listings
    order: Vec<String>,
    default: Arc<AgentDefinition>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::new()
    }

    /// Look up an agent by name, falling back to the default agent.
    pub fn resolve(&self, name: &str) -> Arc<AgentDefinition> {
        match self.agents.get(name) {
            Some(agent) => Arc::clone(agent),
            None => {
                tracing::warn!(
                    agent = %name,
                    fallback = %self.default.name,
                    "Unknown agent, falling back to default"
                );
                Arc::clone(&self.default)
            }
        }
    }

    /// Exact lookup without fallback
    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents.get(name).cloned()
    }

    pub fn default_agent(&self) -> Arc<AgentDefinition> {
        Arc::clone(&self.default)
    }

    /// All agents in registration order
    pub fn all(&self) -> Vec<Arc<AgentDefinition>> {
        self.order
            .iter()
            .filter_map(|name| self.agents.get(name).cloned())
            .collect()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Metadata listing for the UI
    pub fn agent_infos(&self) -> Vec<AgentInfo> {
        self.all().iter().map(|agent| agent.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Builder for creating AgentRegistry with fluent API
pub struct AgentRegistryBuilder {
    agents: Vec<AgentDefinition>,
    default_agent: Option<String>,
}

impl AgentRegistryBuilder {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            default_agent: None,
        }
    }

    pub fn with_agent(mut self, agent: AgentDefinition) -> Self {
        self.agents.push(agent);
        self
    }

    /// Name of the fallback agent. Defaults to the first registered agent.
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_agent = Some(name.into());
        self
    }

    /// Build the AgentRegistry, validating names and handoff targets
    pub fn build(self) -> Result<AgentRegistry> {
        let default_name = match self.default_agent {
            Some(name) => name,
            None => self
                .agents
                .first()
                .map(|a| a.name.clone())
                .ok_or_else(|| {
                    AppError::Configuration("AgentRegistry requires at least one agent".into())
                })?,
        };

        let mut agents = HashMap::new();
        let mut order = Vec::with_capacity(self.agents.len());
        for agent in self.agents {
            if agent.name.trim().is_empty() {
                return Err(AppError::Configuration("Agent name must not be empty".into()));
            }
            if agents.contains_key(&agent.name) {
                return Err(AppError::Configuration(format!(
                    "Duplicate agent name: {}",
                    agent.name
                )));
            }
            order.push(agent.name.clone());
            agents.insert(agent.name.clone(), Arc::new(agent));
        }

        for agent in agents.values() {
            for handoff in &agent.handoffs {
                if !agents.contains_key(&handoff.target) {
                    return Err(AppError::Configuration(format!(
                        "Agent '{}' hands off to unknown agent '{}'",
                        agent.name, handoff.target
                    )));
                }
            }
        }

        let default = agents.get(&default_name).cloned().ok_or_else(|| {
            AppError::Configuration(format!("Default agent '{}' is not registered", default_name))
        })?;

        Ok(AgentRegistry {
            agents,
            order,
            default,
        })
    }
}

impl Default for AgentRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Handoff, Instructions};

    fn agent(name: &str) -> AgentDefinition {
        AgentDefinition::new(name, Instructions::Static(format!("You are {}", name)))
    }

    fn two_agent_registry() -> AgentRegistry {
        AgentRegistry::builder()
            .with_agent(agent("Triage Agent").with_handoff(Handoff::to("FAQ Agent")))
            .with_agent(agent("FAQ Agent").with_handoff(Handoff::to("Triage Agent")))
            .with_default("Triage Agent")
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_known_agent() {
        let registry = two_agent_registry();
        assert_eq!(registry.resolve("FAQ Agent").name, "FAQ Agent");
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_default() {
        let registry = two_agent_registry();
        assert_eq!(registry.resolve("Retired Agent").name, "Triage Agent");
        assert!(registry.get("Retired Agent").is_none());
    }

    #[test]
    fn test_all_preserves_registration_order() {
        let registry = two_agent_registry();
        assert_eq!(registry.agent_names(), vec!["Triage Agent", "FAQ Agent"]);
        assert_eq!(registry.all().len(), 2);
        assert_eq!(registry.agent_infos()[1].handoffs, vec!["Triage Agent"]);
    }

    #[test]
    fn test_default_is_first_agent_when_unset() {
        let registry = AgentRegistry::builder()
            .with_agent(agent("Only Agent"))
            .build()
            .unwrap();
        assert_eq!(registry.default_agent().name, "Only Agent");
    }

    #[test]
    fn test_unknown_handoff_target_is_rejected() {
        let result = AgentRegistry::builder()
            .with_agent(agent("Triage Agent").with_handoff(Handoff::to("Ghost Agent")))
            .build();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_missing_default_is_rejected() {
        let result = AgentRegistry::builder()
            .with_agent(agent("FAQ Agent"))
            .with_default("Triage Agent")
            .build();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let result = AgentRegistry::builder()
            .with_agent(agent("FAQ Agent"))
            .with_agent(agent("FAQ Agent"))
            .build();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        assert!(AgentRegistry::builder().build().is_err());
    }
}
