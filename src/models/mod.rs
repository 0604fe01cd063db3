//! Model client abstraction layer.
//!
//! This module provides:
//! - [`ModelClient`] trait for swappable generation backends
//! - [`ModelRegistry`] mapping model keys to clients
//! - Concrete implementations: OpenAI chat completions, local Ollama
//!
//! # Adding a New Backend
//!
//! 1. Create a new file (e.g., `anthropic.rs`)
//! 2. Implement `ModelClient`
//! 3. Register it in `ModelRegistry::from_config()`
//! 4. Add config fields in `config.rs`

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::Result;

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Generation limits passed to every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

impl From<&Config> for GenerationOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Model client trait — swappable backend abstraction.
///
/// Implementations resolve their own transport failures (timeouts, exit
/// codes, HTTP errors) into an `Err`; the pipeline reports it as a
/// generation failure.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion for a flattened prompt.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Backend model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Model registry — read-only lookup table after construction.
///
/// # Example
///
/// ```ignore
/// let models = ModelRegistry::from_config(&config);
/// let client = models.get("ollama").unwrap();
/// let text = client.generate("[USER] Hi", &options).await?;
/// ```
#[derive(Default, Clone)]
pub struct ModelRegistry {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in backends.
    ///
    /// - `"openai"`: chat completions API with a bearer key
    /// - `"ollama"`: local `ollama run` subprocess
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(
            "openai",
            OpenAiClient::new(&config.openai.api_key, &config.openai.model)
                .with_base_url(&config.openai.base_url),
        );
        registry.register(
            "ollama",
            OllamaClient::new(&config.ollama.model).with_binary(&config.ollama.binary),
        );
        registry
    }

    pub fn register<M: ModelClient + 'static>(&mut self, key: impl Into<String>, client: M) {
        self.clients.insert(key.into(), Arc::new(client));
    }

    /// Register an already shared client.
    pub fn register_shared(&mut self, key: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.clients.insert(key.into(), client);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ModelClient>> {
        self.clients.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.clients.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.clients.keys().map(|s| s.as_str()).collect();
        keys.sort_unstable();
        keys
    }
}

/// Scripted model for testing; replays responses and records prompts.
#[cfg(test)]
pub struct ScriptedModel {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String>>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|s| Ok(s.to_string())).collect())
    }

    pub fn with_results(results: Vec<Result<String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(results.into()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(crate::error::Error::Model("No more scripted responses".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}
