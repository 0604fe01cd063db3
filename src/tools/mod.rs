//! Tools module - capabilities the model can call
//!
//! Tools are invoked when a model response contains a
//! `TOOL:<name>:<json-object>` request. Their output is fed back to the
//! model as developer context.

mod registry;
mod search;
mod wiki;

pub use registry::ToolRegistry;
pub use search::SearchTool;
pub use wiki::WikiTool;

use async_trait::async_trait;
use serde_json::Value;
use crate::Result;

/// Tool trait - interface for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in `TOOL:<name>:` requests
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with parsed parameters
    async fn execute(&self, params: Value) -> Result<String>;
}

/// Dummy tool for testing; records the parameters it receives
#[cfg(test)]
pub struct DummyTool {
    pub name: String,
    pub result: String,
    pub calls: std::sync::Mutex<Vec<Value>>,
}

#[cfg(test)]
impl DummyTool {
    pub fn new(name: &str, result: &str) -> Self {
        Self {
            name: name.to_string(),
            result: result.to_string(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Dummy tool for testing" }

    async fn execute(&self, params: Value) -> Result<String> {
        self.calls.lock().unwrap().push(params);
        Ok(self.result.clone())
    }
}

/// Tool that always fails, for testing error recovery
#[cfg(test)]
pub struct FailingTool;

#[cfg(test)]
#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str { "broken" }
    fn description(&self) -> &str { "Always fails" }

    async fn execute(&self, _params: Value) -> Result<String> {
        Err(crate::error::Error::Tool("backend unreachable".to_string()))
    }
}
