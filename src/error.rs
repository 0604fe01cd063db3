//! Error types for contextgate

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for contextgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Checkpoint at which a policy gate rejected text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStage {
    /// The assembled prompt, before any model call
    Input,
    /// The first model response, before any tool round
    Response,
    /// The last response, right before it is returned
    Final,
}

impl fmt::Display for PolicyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicyStage::Input => "input",
            PolicyStage::Response => "response",
            PolicyStage::Final => "final",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in contextgate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Policy violation at {stage} stage")]
    PolicyRejected { stage: PolicyStage },

    #[error("Model {0} not configured")]
    ModelUnavailable(String),

    #[error("Generation failed on model {model}: {cause}")]
    GenerationFailed { model: String, cause: String },

    #[error("Request exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Tool {name} failed: {cause}")]
    ToolInvocationFailed { name: String, cause: String },

    #[error("Malformed payload for tool {name}: {cause}")]
    MalformedToolPayload { name: String, cause: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for outcomes the pipeline hands back to the caller as a
    /// rejection rather than an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::PolicyRejected { .. } | Error::ModelUnavailable(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
