use crate::agents::AirlineAgentContext;
use crate::types::{Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value, context: &mut AirlineAgentContext) -> Result<Value>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a new registry with the airline customer-service tools
    pub fn with_airline_tools() -> Self {
        let mut registry = Self::new();
        for tool in crate::tools::airline::all_tools() {
            registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| definition(tool.as_ref())).collect()
    }

    /// Definitions for the named tools, in the order given. Unknown names are skipped.
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| definition(tool.as_ref()))
            .collect()
    }

    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        context: &mut AirlineAgentContext,
    ) -> Result<Value> {
        if let Some(tool) = self.tools.get(name) {
            tool.execute(args, context).await
        } else {
            Err(crate::types::AppError::NotFound(format!(
                "Tool not found: {}",
                name
            )))
        }
    }

    /// Get a list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

fn definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.tool_names().len(), 0);
    }

    #[test]
    fn test_registry_with_airline_tools() {
        let registry = ToolRegistry::with_airline_tools();

        assert_eq!(registry.tool_names().len(), 6);
        assert!(registry.has_tool("faq_lookup_tool"));
        assert!(registry.has_tool("update_seat"));
        assert!(registry.has_tool("display_seat_map"));
        assert!(registry.has_tool("cancel_flight"));
    }

    #[test]
    fn test_get_tool_definitions() {
        let registry = ToolRegistry::with_airline_tools();
        let definitions = registry.get_tool_definitions();

        for def in &definitions {
            assert!(!def.name.is_empty());
            assert!(!def.description.is_empty());
            assert!(def.parameters.is_object());
        }
    }

    #[test]
    fn test_definitions_for_keeps_requested_order() {
        let registry = ToolRegistry::with_airline_tools();
        let names = vec![
            "display_seat_map".to_string(),
            "missing".to_string(),
            "update_seat".to_string(),
        ];
        let defs = registry.definitions_for(&names);
        let got: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(got, vec!["display_seat_map", "update_seat"]);
    }

    #[tokio::test]
    async fn test_nonexistent_tool() {
        let registry = ToolRegistry::with_airline_tools();
        let mut ctx = AirlineAgentContext::default();

        let result = registry
            .execute("nonexistent_tool", serde_json::json!({}), &mut ctx)
            .await;
        assert!(result.is_err());
    }
}
