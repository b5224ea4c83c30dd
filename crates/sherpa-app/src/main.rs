//! Electric Sherpa binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Read credentials from the environment (fatal when incomplete)
//! 3. Build the Google Maps and Vertex RAG clients once
//! 4. Run the terminal chat loop or the HTTP API

mod cli;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use sherpa_api::AppState;
use sherpa_chat::{ChatError, ChatOrchestrator};
use sherpa_core::config::{Credentials, SherpaConfig};
use sherpa_manual::VertexRagAnswerer;
use sherpa_places::GoogleMapsPlaces;

use cli::{CliArgs, Command};

const GREETING: &str = "How can I help you with your EV today? (Enter 'exit' or 'quit' to quit)";

fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Read utterances from stdin until `exit`, `quit` or end of input.
async fn run_repl(
    orchestrator: &ChatOrchestrator,
    assistant_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_id: Option<Uuid> = None;

    println!("{GREETING}");

    loop {
        print!("User: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let reply = match orchestrator.handle_message(&line, session_id).await {
            Ok((response, id)) => {
                session_id = Some(id);
                response.reply
            }
            Err(e @ ChatError::MessageTooLong(_)) => format!("Sorry, your {e}."),
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                "Sorry, something went wrong. Please try again.".to_string()
            }
        };
        println!("{assistant_name}: {reply}");
    }

    tracing::debug!("Chat loop ended");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Load before tracing so the configured level can apply.
    let config_file = args.resolve_config_path();
    let loaded = SherpaConfig::load(&config_file);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => SherpaConfig::default(),
    };

    // Tracing, on stderr so the chat transcript owns stdout.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Electric Sherpa v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    // Credentials.
    let credentials = Credentials::from_env().map_err(|e| {
        tracing::error!(error = %e, "Credentials incomplete");
        e
    })?;
    tracing::debug!(?credentials, "Credentials loaded");

    // Collaborators, built once and shared by every turn.
    let places = GoogleMapsPlaces::new(
        credentials.gmaps_api_key.clone(),
        &config.places,
        &config.http,
    )?;
    let manual = VertexRagAnswerer::new(&credentials, &config.manual, &config.http)?;
    tracing::info!(
        model = %config.manual.model,
        endpoint = %manual.endpoint(),
        "Manual answerer ready"
    );

    let command = args.command();
    config.server.port = command.resolve_port(config.server.port);

    let orchestrator =
        ChatOrchestrator::with_collaborators(&config, Arc::new(manual), Arc::new(places));

    match command {
        Command::Chat => {
            let assistant_name = config.general.assistant_name.clone();
            run_repl(&orchestrator, &assistant_name).await?;
        }
        Command::Serve { .. } => {
            let state = AppState::new(config, orchestrator);
            sherpa_api::start_server(state).await?;
        }
    }

    Ok(())
}
