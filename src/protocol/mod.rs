//! Protocol module — the request pipeline.
//!
//! This module contains:
//! - Layered context and prompt flattening
//! - Tool-call detection in model output
//! - Response cache and metrics sink
//! - The protocol handler tying them together

mod cache;
mod context;
mod handler;
mod metrics;
mod tool_call;

pub use cache::{InMemoryCache, ResponseCache};
pub use context::{build_prompt, ContextLayers, Layer};
pub use handler::{Completion, ProtocolHandler};
pub use metrics::{InMemoryMetrics, MetricsSink, MetricsSnapshot};
pub use tool_call::{extract_tool_requests, ToolRequest};
