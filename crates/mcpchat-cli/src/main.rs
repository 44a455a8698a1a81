//! mcpchat - chat with a language model that can call MCP tools.
//!
//! Loads `.env`, reads the server configuration, connects every server,
//! then runs an interactive loop until an exit word, end of input or Ctrl-C
//! at the prompt. Connections are closed on every exit path.

mod repl;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use mcpchat_core::config::{
    ChatSettings, ConfigError, ConfigFile, ConfigProvider, FileConfigProvider,
};
use mcpchat_core::gateway::{create_gateway, GatewayConfig};
use mcpchat_core::logging::{ConsoleLogger, LogLevel, Logger};
use mcpchat_core::{
    ChatEvent, ChatSession, ConnectionPool, EnvSecretStore, McpConnector, ToolFilter, ToolRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "mcpchat", about = "Chat with a model that can call MCP tools", version)]
struct Cli {
    /// Server configuration file (JSON, or YAML by extension).
    /// Defaults to ./server_config.json, then the user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use (overrides `chat.model`; `mock` runs offline).
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum tool rounds per query (overrides `chat.max_rounds`).
    #[arg(long)]
    max_rounds: Option<usize>,

    /// System prompt (overrides `chat.system_prompt`).
    #[arg(long)]
    system: Option<String>,

    /// Environment file with API keys.
    /// Defaults to `.env` in the working directory or a parent.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, settings: &mut ChatSettings) {
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(rounds) = self.max_rounds {
            settings.max_rounds = rounds;
        }
        if let Some(system) = &self.system {
            settings.system_prompt = Some(system.clone());
        }
    }
}

fn make_logger(verbose: bool) -> Arc<dyn Logger> {
    let logger = ConsoleLogger::new();
    let logger = if verbose {
        logger.with_level(LogLevel::Debug)
    } else if std::env::var(mcpchat_core::logging::LOG_LEVEL_ENV).is_err() {
        logger.with_level(LogLevel::Warn)
    } else {
        logger
    };
    Arc::new(logger)
}

/// Load variables from an env file; variables already set are kept
///
/// A missing default `.env` is not an error, a missing explicit file is.
fn load_env_file(path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Error loading environment from {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

/// Load the config file; a missing default file means no servers
async fn load_config(cli: &Cli, logger: &Arc<dyn Logger>) -> anyhow::Result<ConfigFile> {
    let provider = match &cli.config {
        Some(path) => FileConfigProvider::new(path),
        None => FileConfigProvider::discover(),
    };

    match provider.load().await {
        Ok(config) => {
            logger.info(&format!("Loaded configuration from {}", provider.path().display()));
            Ok(config)
        }
        Err(ConfigError::NotFound(path)) if cli.config.is_none() => {
            logger.warn(&format!(
                "No configuration at {}; starting without tool servers",
                path.display()
            ));
            Ok(ConfigFile::default())
        }
        Err(e) => Err(e).context("Error loading server configuration"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_file = load_env_file(cli.env_file.as_deref())?;
    let logger = make_logger(cli.verbose);
    if let Some(path) = env_file {
        logger.debug(&format!("Loaded environment from {}", path.display()));
    }

    let mut config = load_config(&cli, &logger).await?;
    cli.apply(&mut config.chat);
    let settings = config.chat.clone();

    let registry = Arc::new(ToolRegistry::new(Arc::clone(&logger)));
    if !settings.excluded_tools.is_empty() {
        let excluded = settings.excluded_tools.iter().cloned();
        registry.set_filter(ToolFilter::new().with_exclude(excluded));
    }

    let pool = ConnectionPool::new(Arc::clone(&logger));
    let connector = McpConnector::new(Arc::clone(&logger));
    let report = pool
        .acquire_all(&config.mcp_servers, &connector, &registry)
        .await;

    for provider in &report.connected {
        println!("\nConnected to {} with tools: {:?}", provider.name, provider.tools);
    }
    for failed in &report.failed {
        eprintln!("Failed to connect to {}: {}", failed.name, failed.reason);
    }

    let gateway = create_gateway(
        GatewayConfig::from(&settings),
        Arc::new(EnvSecretStore::new()),
        Arc::clone(&logger),
    );

    let mut session =
        ChatSession::new(Arc::from(gateway), Arc::clone(&registry), Arc::clone(&logger))
            .with_max_rounds(settings.max_rounds)
            .with_event_handler(print_event);

    pool.scoped(|| async move { repl::run(&mut session, &settings).await })
        .await
}

fn print_event(event: &ChatEvent) {
    match event {
        ChatEvent::AssistantText(text) => println!("{}", text),
        ChatEvent::ToolCall { name, input } => {
            println!("Calling tool {} with args {}", name, input)
        }
        ChatEvent::ToolResult { name, is_error: true } => {
            eprintln!("Tool {} reported an error", name)
        }
        ChatEvent::ToolResult { .. } => {}
    }
}
