//! Search tool - placeholder search backend

use async_trait::async_trait;
use serde_json::Value;
use crate::Result;
use crate::error::Error;
use super::Tool;

const DEFAULT_MAX_RESULTS: u64 = 5;

/// Mock search; replace with a real search API
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str { "search" }
    fn description(&self) -> &str { "Search for information (params: query, max_results)" }

    async fn execute(&self, params: Value) -> Result<String> {
        let query = params.get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Tool("Missing 'query' parameter".to_string()))?;

        let max_results = params.get("max_results")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_MAX_RESULTS);

        Ok(format!(
            "Mock search results for: {}\nFound {} results.",
            query, max_results
        ))
    }
}
