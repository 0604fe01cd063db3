//! Tool registry - manages and executes tools

use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;
use crate::Result;
use crate::error::Error;
use super::{SearchTool, Tool, WikiTool};

/// Tool registry maps names to tools; read-only once built
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with the built-in tools
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SearchTool);
        registry.register(WikiTool);
        registry
    }

    /// Register a tool under its own name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Register an already shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<String> {
        let tool = self.tools.get(name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {}", name)))?;

        tool.execute(params).await
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Name and description of every tool, sorted by name
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self.tools.values()
            .map(|t| (t.name(), t.description()))
            .collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::DummyTool;

    #[tokio::test]
    async fn test_tool_registry_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(DummyTool::new("test_tool", "success"));

        assert!(registry.has("test_tool"));

        let result = registry.execute("test_tool", serde_json::json!({})).await.unwrap();
        assert_eq!(result, "success");
    }

    #[tokio::test]
    async fn test_tool_registry_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.execute("unknown", serde_json::json!({})).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let registry = ToolRegistry::with_defaults();
        assert_eq!(registry.tool_names(), vec!["search", "wiki"]);
        assert_eq!(registry.descriptions().len(), 2);
    }
}
