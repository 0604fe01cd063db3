//! OpenAI chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Error;
use crate::Result;

use super::{GenerationOptions, ModelClient};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client using bearer key authentication.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &str, options: &GenerationOptions) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        })
    }

    fn parse_response(&self, completion: ChatCompletion) -> Result<String> {
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Model("No choices in OpenAI response".to_string()))
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(Error::Model("OpenAI API key not set".to_string()));
        }

        let request = self.build_request(prompt, options);
        let response = self
            .client
            .post(self.build_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(Error::Model(format!("OpenAI API error ({status}): {error_text}")));
        }

        let completion: ChatCompletion = response.json().await?;
        self.parse_response(completion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let client = OpenAiClient::new("sk-test", "gpt-4o-mini");
        let options = GenerationOptions {
            max_tokens: 50,
            temperature: 0.5,
        };
        let request = client.build_request("[USER] Hi", &options);

        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["messages"][0]["content"], "[USER] Hi");
        assert_eq!(request["max_tokens"], 50);
        assert_eq!(request["temperature"], 0.5);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiClient::new("k", "m").with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.build_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_parse_response() {
        let client = OpenAiClient::new("k", "m");
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Penguins!"}}]}"#,
        )
        .unwrap();
        assert_eq!(client.parse_response(completion).unwrap(), "Penguins!");

        let empty: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(client.parse_response(empty).is_err());
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = OpenAiClient::new("", "m");
        let result = client.generate("prompt", &GenerationOptions::default()).await;
        assert!(matches!(result, Err(Error::Model(_))));
    }
}
