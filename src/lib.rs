//! contextgate - layered-context request pipeline for generative models
//!
//! This library composes system/developer/user context into prompts,
//! screens them against content policy, caches responses, and lets models
//! call tools with `TOOL:<name>:<json-object>` before answering.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod protocol;
pub mod tools;
pub mod ui;

pub use error::{Error, PolicyStage, Result};
pub use protocol::{Completion, ContextLayers, Layer, ProtocolHandler};
