//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::Result;
use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Serve repeated prompts from the response cache
    #[serde(default = "default_true")]
    pub enable_caching: bool,

    /// Record per-request outcome and latency
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Phrases rejected by the policy gates (case-insensitive)
    #[serde(default)]
    pub forbidden_phrases: Vec<String>,

    /// Optional file with additional forbidden phrases, one per line
    #[serde(default)]
    pub policy_file: Option<PathBuf>,

    /// Model key used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Generation limit passed to every model call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature passed to every model call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tool loop rounds per request
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Deadline for a whole request, tool rounds included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// OpenAI backend configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama backend configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Executable invoked for local generation
    #[serde(default = "default_ollama_binary")]
    pub binary: String,
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "ollama".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tool_rounds() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_ollama_binary() -> String {
    "ollama".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_caching: true,
            enable_metrics: true,
            forbidden_phrases: Vec::new(),
            policy_file: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_tool_rounds: default_max_tool_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            binary: default_ollama_binary(),
        }
    }
}

impl Config {
    /// All forbidden phrases: the inline list followed by the policy file.
    ///
    /// Blank lines and lines starting with `#` in the policy file are skipped.
    pub fn policy_phrases(&self) -> Result<Vec<String>> {
        let mut phrases = self.forbidden_phrases.clone();

        if let Some(path) = &self.policy_file {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read policy file {:?}: {}", path, e))
            })?;
            phrases.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(str::to_string),
            );
        }

        Ok(phrases)
    }

    /// Per-request deadline
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".contextgate")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location
pub fn load() -> Result<Config> {
    let path = config_path();

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'contextgate init' first.",
            path
        )));
    }

    load_from(&path)
}

/// Load configuration from an explicit file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

/// Save configuration to an explicit file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    // Create parent directory
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_model, "ollama");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.max_tool_rounds, 5);
        assert!(config.enable_caching);
        assert!(config.enable_metrics);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"default_model": "openai"}"#).unwrap();
        assert_eq!(config.default_model, "openai");
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.ollama.binary, "ollama");
    }

    #[test]
    fn test_save_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.forbidden_phrases = vec!["secret plan".to_string()];
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.forbidden_phrases, vec!["secret plan".to_string()]);
    }

    #[test]
    fn test_policy_phrases_merges_file() {
        let tmp = TempDir::new().unwrap();
        let policy = tmp.path().join("constitution.txt");
        std::fs::write(&policy, "# banned\nforbidden topic\n\n  another one  \n").unwrap();

        let mut config = Config::default();
        config.forbidden_phrases = vec!["inline".to_string()];
        config.policy_file = Some(policy);

        let phrases = config.policy_phrases().unwrap();
        assert_eq!(phrases, vec!["inline", "forbidden topic", "another one"]);
    }

    #[test]
    fn test_policy_phrases_missing_file() {
        let mut config = Config::default();
        config.policy_file = Some(PathBuf::from("/nonexistent/policy.txt"));
        assert!(matches!(config.policy_phrases(), Err(Error::Config(_))));
    }
}
