//! Ollama client - local generation through the `ollama` CLI

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::{GenerationOptions, ModelClient};

/// Runs `ollama run <model> <prompt>` as a subprocess.
///
/// The CLI takes no sampling flags, so generation options are only logged.
/// The child is killed if the request future is dropped.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    model: String,
    binary: String,
}

impl OllamaClient {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            binary: "ollama".to_string(),
        }
    }

    /// Use a different executable (absolute path or name on `PATH`).
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        debug!(
            "Running {} for model {} (max_tokens={}, temperature={})",
            self.binary, self.model, options.max_tokens, options.temperature
        );

        let output = Command::new(&self.binary)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Model(format!("Failed to execute {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Model(format!(
                "Ollama exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_reads_stdout() {
        let client = OllamaClient::new("test-model").with_binary("echo");
        let text = client.generate("hello", &GenerationOptions::default()).await.unwrap();
        assert_eq!(text, "run test-model hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let client = OllamaClient::new("test-model").with_binary("false");
        let result = client.generate("hello", &GenerationOptions::default()).await;
        assert!(matches!(result, Err(Error::Model(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let client = OllamaClient::new("m").with_binary("/nonexistent/ollama-binary");
        let result = client.generate("hello", &GenerationOptions::default()).await;
        assert!(result.is_err());
    }
}
