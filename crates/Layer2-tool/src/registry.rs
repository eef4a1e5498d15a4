//! Tool Registry - manages available tools
//!
//! An explicit, instance-scoped registry: construct one, register tools,
//! inject it into the dispatcher. Nothing here is process-global, so
//! tests and independent dispatchers can each hold their own set.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::{Tool, ToolDef};
use toolgate_foundation::ToolResult;

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with the default builtin tools
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(crate::builtin::echo::EchoTool::new()));
        registry.register(Arc::new(crate::builtin::weather::WeatherTool::new()));
        registry.register(Arc::new(crate::builtin::http::HttpRequestTool::new()));

        registry
    }

    /// Register a tool (replaces an existing one with the same name)
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "tool re-registered, previous implementation replaced");
        }
    }

    /// Unregister a tool
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool definitions (for sending to the LLM)
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Get all tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a tool by name
    ///
    /// An unknown tool is a failed result, not a panic, so one bad call
    /// in a batch cannot take down its siblings.
    pub async fn execute(&self, name: &str, params: Value) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.execute(params).await,
            None => ToolResult::fail(format!("Tool '{}' not found", name)),
        }
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_builtins_registered() {
        let registry = ToolRegistry::with_builtins();

        assert!(registry.contains("echo"));
        assert!(registry.contains("weather"));
        assert!(registry.contains("http_request"));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_failed_result() {
        let registry = ToolRegistry::new();
        let result = registry.execute("missing", json!({})).await;

        assert!(!result.success);
        assert!(result.error_message().contains("not found"));
    }

    #[tokio::test]
    async fn test_execute_by_name() {
        let registry = ToolRegistry::with_builtins();
        let result = registry.execute("echo", json!({"message": "hi"})).await;

        assert!(result.success);
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let registry = ToolRegistry::with_builtins();
        let mut names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["echo", "http_request", "weather"]);
    }
}
