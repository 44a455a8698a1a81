//! Interactive read-query loop

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use mcpchat_core::config::ChatSettings;
use mcpchat_core::gateway::GatewayError;
use mcpchat_core::{CancellationToken, ChatError, ChatSession, EnvSecretStore};

/// Lines that end the session, compared case-insensitively
const EXIT_COMMANDS: &[&str] = &["quit", "exit", "salir"];

/// What to do with one line of input
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Skip,
    Exit,
    Query(&'a str),
}

pub fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Skip
    } else if EXIT_COMMANDS.iter().any(|c| trimmed.eq_ignore_ascii_case(c)) {
        Input::Exit
    } else {
        Input::Query(trimmed)
    }
}

/// Read queries from stdin until an exit command, end of input or Ctrl-C
///
/// Ctrl-C while a query runs cancels that query only.
pub async fn run(session: &mut ChatSession, settings: &ChatSettings) -> anyhow::Result<()> {
    println!("\nMCP Chatbot started ({})", settings.model);
    println!("Type your queries or 'quit' to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nQuery: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        let query = match classify(&line) {
            Input::Skip => continue,
            Input::Exit => break,
            Input::Query(query) => query,
        };

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        match session.process_query(query, &cancel).await {
            Ok(_) => println!(),
            Err(ChatError::Cancelled) => println!("\n(cancelled)"),
            Err(ChatError::Gateway(GatewayError::MissingApiKey { provider })) => {
                let vars = EnvSecretStore::env_vars_for(&provider)
                    .map(|v| v.join(" or "))
                    .unwrap_or_else(|| format!("{}_API_KEY", provider.to_uppercase()));
                eprintln!("\nError: no API key for {}; set {}", provider, vars);
            }
            Err(e) => eprintln!("\nError: {}", e),
        }
        watcher.abort();
    }

    Ok(())
}
