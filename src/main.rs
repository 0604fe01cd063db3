//! contextgate CLI entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use contextgate::config::{self, Config};
use contextgate::models::ModelRegistry;
use contextgate::policy::PhrasePolicy;
use contextgate::tools::ToolRegistry;
use contextgate::{ui, ContextLayers, Layer, ProtocolHandler};

#[derive(Parser)]
#[command(name = "contextgate")]
#[command(about = "Layered-context request pipeline for generative models")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.contextgate/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request through the pipeline
    Ask {
        /// System-layer message (repeatable)
        #[arg(long)]
        system: Vec<String>,

        /// Developer-layer message (repeatable)
        #[arg(long)]
        developer: Vec<String>,

        /// User-layer message (repeatable)
        #[arg(short, long)]
        user: Vec<String>,

        /// Model key (defaults to the configured default)
        #[arg(short, long)]
        model: Option<String>,

        /// Print the metrics snapshot as JSON afterwards
        #[arg(long)]
        stats: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask { system, developer, user, model, stats } => {
            let config = load_config(cli.config.as_deref())?;
            let context = build_context(system, developer, user);
            run_ask(&config, &context, model.as_deref(), stats).await?;
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::config_path);
            if path.exists() && !force {
                ui::print_warning(&format!("{:?} already exists (use --force to overwrite)", path));
                return Ok(());
            }
            config::save_to(&Config::default(), &path)?;
            ui::print_success(&format!("Wrote default config to {:?}", path));
        }

        Commands::Status => {
            let config = load_config(cli.config.as_deref())?;
            let models = ModelRegistry::from_config(&config);
            let tools = ToolRegistry::with_defaults();

            let policy = PhrasePolicy::new(config.policy_phrases()?);

            ui::print_header(&config.default_model, &models.keys(), &tools.tool_names());
            if !models.has(&config.default_model) {
                ui::print_warning(&format!(
                    "Default model '{}' is not registered",
                    config.default_model
                ));
            }
            ui::print_step(&format!("Caching: {}", on_off(config.enable_caching)));
            ui::print_step(&format!("Metrics: {}", on_off(config.enable_metrics)));
            ui::print_step(&format!("Forbidden phrases: {}", policy.phrases().len()));
            ui::print_step(&format!(
                "Generation: max_tokens={}, temperature={}",
                config.max_tokens, config.temperature
            ));
            ui::print_step(&format!(
                "Tool rounds: {}, deadline: {}s",
                config.max_tool_rounds, config.request_timeout_secs
            ));
            ui::print_step(&format!(
                "OpenAI key: {}",
                if config.openai.api_key.is_empty() { "not set" } else { "✓" }
            ));
            for (name, description) in tools.descriptions() {
                ui::print_step(&format!("{}: {}", name, description));
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(config::load_from(path)?),
        None => match config::load() {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Ok(Config::default())
            }
        },
    }
}

/// Layers from flags, or the demo conversation when no flag is given.
fn build_context(system: Vec<String>, developer: Vec<String>, user: Vec<String>) -> ContextLayers {
    let context = ContextLayers { system, developer, user };
    if !context.is_empty() {
        return context;
    }

    ContextLayers::new()
        .with(Layer::System, "Follow the constitution and do not produce disallowed content.")
        .with(
            Layer::Developer,
            "If user requests a search, reply with TOOL:search:{\"query\": \"...\"}.",
        )
        .with(
            Layer::User,
            "Hello! Can you tell me about penguins? Also, please search for 'Arctic animals'.",
        )
}

async fn run_ask(config: &Config, context: &ContextLayers, model: Option<&str>, stats: bool) -> Result<()> {
    let handler = ProtocolHandler::new(
        config,
        ModelRegistry::from_config(config),
        ToolRegistry::with_defaults(),
    )?;

    let outcome = handler.process(context, model).await;
    match &outcome {
        Ok(completion) => {
            if completion.truncated {
                ui::print_warning("Tool round limit reached; showing last response");
            }
            println!("\n{}\n", completion.text);
        }
        Err(e) if e.is_rejection() => ui::print_warning(&e.to_string()),
        Err(e) => ui::print_error(&e.to_string()),
    }

    if stats {
        if let Some(metrics) = handler.metrics() {
            println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
        }
    }

    // Rejections are a normal answer; anything else fails the command.
    match outcome {
        Err(e) if !e.is_rejection() => Err(e.into()),
        _ => Ok(()),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context_demo_when_no_flags() {
        let context = build_context(vec![], vec![], vec![]);
        assert_eq!(context.system.len(), 1);
        assert_eq!(context.developer.len(), 1);
        assert!(context.user[0].contains("penguins"));
    }

    #[test]
    fn test_build_context_uses_flags_only() {
        let context = build_context(vec![], vec![], vec!["hi".to_string()]);
        assert!(context.system.is_empty());
        assert!(context.developer.is_empty());
        assert_eq!(context.user, vec!["hi"]);
    }

    #[tokio::test]
    async fn test_run_ask_fails_when_generation_fails() {
        let mut config = Config::default();
        config.ollama.binary = "/nonexistent/ollama".to_string();
        let context = build_context(vec![], vec![], vec!["hi".to_string()]);

        let err = run_ask(&config, &context, Some("ollama"), false).await.unwrap_err();
        assert!(err.to_string().contains("Generation failed on model ollama"));
    }

    #[tokio::test]
    async fn test_run_ask_rejection_is_not_a_failure() {
        let mut config = Config::default();
        config.forbidden_phrases = vec!["penguins".to_string()];
        let context = build_context(vec![], vec![], vec![]);

        assert!(run_ask(&config, &context, None, false).await.is_ok());
    }
}
