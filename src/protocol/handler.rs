//! Protocol handler - the request pipeline
//!
//! Stages, in order: assemble prompt, input policy gate, cache lookup,
//! model selection, generation, response policy gate, tool loop, final
//! policy gate, cache store and metrics. Only the tool loop repeats.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::{Error, PolicyStage};
use crate::models::{GenerationOptions, ModelClient, ModelRegistry};
use crate::policy::{PhrasePolicy, Policy};
use crate::tools::ToolRegistry;
use crate::Result;

use super::cache::{InMemoryCache, ResponseCache};
use super::context::{build_prompt, ContextLayers};
use super::metrics::{InMemoryMetrics, MetricsSink};
use super::tool_call::{extract_tool_requests, ToolRequest};

/// Successful outcome of [`ProtocolHandler::process`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    /// Tool loop rounds run: one tool request and one regeneration each
    pub tool_rounds: usize,
    /// The round limit was hit while the model still requested tools
    pub truncated: bool,
    pub from_cache: bool,
}

impl Completion {
    fn cached(text: String) -> Self {
        Self {
            text,
            tool_rounds: 0,
            truncated: false,
            from_cache: true,
        }
    }
}

/// Drives requests through policy, cache, model and tool stages.
///
/// Shareable across tasks: cache and metrics guard themselves, registries
/// are read-only.
pub struct ProtocolHandler {
    models: ModelRegistry,
    tools: ToolRegistry,
    policy: Box<dyn Policy>,
    cache: Option<Arc<dyn ResponseCache>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    default_model: String,
    options: GenerationOptions,
    max_tool_rounds: usize,
    timeout: Duration,
}

impl ProtocolHandler {
    /// Build a handler with in-memory cache and metrics as configured.
    pub fn new(config: &Config, models: ModelRegistry, tools: ToolRegistry) -> Result<Self> {
        let policy = PhrasePolicy::new(config.policy_phrases()?);

        let cache = config
            .enable_caching
            .then(|| Arc::new(InMemoryCache::new()) as Arc<dyn ResponseCache>);
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(InMemoryMetrics::new()) as Arc<dyn MetricsSink>);

        Ok(Self {
            models,
            tools,
            policy: Box::new(policy),
            cache,
            metrics,
            default_model: config.default_model.clone(),
            options: GenerationOptions::from(config),
            max_tool_rounds: config.max_tool_rounds,
            timeout: config.request_timeout(),
        })
    }

    pub fn with_policy<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Use a different cache store (enables caching).
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a different metrics sink (enables metrics).
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResponseCache>> {
        self.cache.as_ref()
    }

    pub fn metrics(&self) -> Option<&Arc<dyn MetricsSink>> {
        self.metrics.as_ref()
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one request through the pipeline.
    ///
    /// `model` selects a registered model key; `None` uses the configured
    /// default. The caller's context is never modified.
    pub async fn process(&self, context: &ContextLayers, model: Option<&str>) -> Result<Completion> {
        let span = info_span!("process", request_id = %uuid::Uuid::new_v4());
        self.process_inner(context, model).instrument(span).await
    }

    async fn process_inner(&self, context: &ContextLayers, model: Option<&str>) -> Result<Completion> {
        let started = Instant::now();
        let prompt = build_prompt(context);

        info!("Processing request: {} chars", prompt.len());

        if !self.policy.check(&prompt) {
            warn!("Prompt rejected by policy");
            self.record(false, started.elapsed());
            return Err(Error::PolicyRejected { stage: PolicyStage::Input });
        }

        if let Some(cache) = &self.cache {
            if let Some(text) = cache.get(&prompt) {
                debug!("Cache hit: {} chars", text.len());
                return Ok(Completion::cached(text));
            }
        }

        let key = model.unwrap_or(&self.default_model);
        let client = self.models.get(key).ok_or_else(|| {
            warn!("Model {} not configured", key);
            Error::ModelUnavailable(key.to_string())
        })?;

        let pipeline = self.run(context, &prompt, key, client.as_ref());
        let outcome = match tokio::time::timeout(self.timeout, pipeline).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Request exceeded deadline of {:?}", self.timeout);
                Err(Error::Timeout(self.timeout))
            }
        };

        let elapsed = started.elapsed();
        match outcome {
            Ok(completion) => {
                if let Some(cache) = &self.cache {
                    cache.set(&prompt, &completion.text);
                }
                self.record(true, elapsed);
                info!(
                    "Request completed in {:?}: {} chars, {} tool round(s)",
                    elapsed,
                    completion.text.len(),
                    completion.tool_rounds
                );
                Ok(completion)
            }
            Err(e) => {
                self.record(false, elapsed);
                Err(e)
            }
        }
    }

    /// Generation, response gate, tool loop and final gate.
    async fn run(
        &self,
        context: &ContextLayers,
        prompt: &str,
        key: &str,
        client: &dyn ModelClient,
    ) -> Result<Completion> {
        let mut response = self.generate(client, key, prompt).await?;
        self.screen(&response, PolicyStage::Response)?;

        let mut rounds = 0;
        let mut truncated = false;

        'tool_loop: loop {
            let requests = extract_tool_requests(&response);
            if requests.is_empty() {
                break;
            }
            debug!("Extracted {} tool request(s)", requests.len());

            for (i, request) in requests.iter().enumerate() {
                if rounds == self.max_tool_rounds {
                    warn!(
                        "Tool round limit ({}) reached with {} pending request(s); returning last response",
                        self.max_tool_rounds,
                        requests.len() - i
                    );
                    truncated = true;
                    break 'tool_loop;
                }

                rounds += 1;
                debug!("Tool round {}: {}", rounds, request.name);

                let result = self.run_tool(request).await;
                let derived = context.derive_with_note(format!("Tool {} result: {}", request.name, result));
                response = self.generate(client, key, &build_prompt(&derived)).await?;
            }
        }

        self.screen(&response, PolicyStage::Final)?;

        Ok(Completion {
            text: response,
            tool_rounds: rounds,
            truncated,
            from_cache: false,
        })
    }

    async fn generate(&self, client: &dyn ModelClient, key: &str, prompt: &str) -> Result<String> {
        debug!("Generating with {} ({}): {} chars", key, client.model_name(), prompt.len());

        client.generate(prompt, &self.options).await.map_err(|e| {
            warn!("Generation failed on {}: {}", key, e);
            Error::GenerationFailed {
                model: key.to_string(),
                cause: e.to_string(),
            }
        })
    }

    fn screen(&self, text: &str, stage: PolicyStage) -> Result<()> {
        if self.policy.check(text) {
            Ok(())
        } else {
            warn!("Text rejected by policy at {} stage", stage);
            Err(Error::PolicyRejected { stage })
        }
    }

    /// Tool failures come back as text for the model to react to.
    async fn run_tool(&self, request: &ToolRequest) -> String {
        debug!("Executing tool: {} with payload: {}", request.name, request.payload);

        let params = match request.parameters() {
            Ok(params) => params,
            Err(e) => {
                warn!("{}", e);
                return format!("Error executing tool: {}", e);
            }
        };

        if !self.tools.has(&request.name) {
            warn!("Tool {} not found", request.name);
            return format!("Error: tool {} not found.", request.name);
        }

        match self.tools.execute(&request.name, params).await {
            Ok(result) => {
                debug!("Tool {} succeeded: {} chars", request.name, result.len());
                result
            }
            Err(e) => {
                let err = Error::ToolInvocationFailed {
                    name: request.name.clone(),
                    cause: e.to_string(),
                };
                warn!("{}", err);
                format!("Error executing tool: {}", e)
            }
        }
    }

    fn record(&self, success: bool, duration: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics.record(success, duration);
        }
    }
}
