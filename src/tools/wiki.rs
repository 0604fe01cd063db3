//! Encyclopedia lookup tool - placeholder backend

use async_trait::async_trait;
use serde_json::Value;
use crate::Result;
use crate::error::Error;
use super::Tool;

/// Mock encyclopedia extract; replace with a real API call
pub struct WikiTool;

#[async_trait]
impl Tool for WikiTool {
    fn name(&self) -> &str { "wiki" }
    fn description(&self) -> &str { "Look up an encyclopedia topic (params: topic, language, extract_length)" }

    async fn execute(&self, params: Value) -> Result<String> {
        let topic = params.get("topic")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Tool("Missing 'topic' parameter".to_string()))?;

        let language = params.get("language")
            .and_then(|v| v.as_str())
            .unwrap_or("en");

        let extract_length = params.get("extract_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(500);

        Ok(format!(
            "Mock encyclopedia extract for '{}' in {}:\nLorem ipsum dolor sit amet... ({} chars)",
            topic, language, extract_length
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_wiki_defaults() {
        let result = WikiTool.execute(json!({"topic": "Penguin"})).await.unwrap();
        assert!(result.contains("'Penguin' in en"));
        assert!(result.contains("(500 chars)"));
    }

    #[test]
    fn test_wiki_language() {
        let result = tokio_test::block_on(
            WikiTool.execute(json!({"topic": "Pingouin", "language": "fr", "extract_length": 120})),
        )
        .unwrap();
        assert!(result.contains("in fr"));
        assert!(result.contains("(120 chars)"));
    }
}
