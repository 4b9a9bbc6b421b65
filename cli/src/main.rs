//! CLI entrypoint for gameplan
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod repl;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use commands::{Cli, Command};
use gameplan_application::{GameError, GameOrchestrator};
use gameplan_domain::{Difficulty, ProviderId, SessionId, TopicId, UserId};
use gameplan_infrastructure::{
    BootstrapOptions, ConfigLoader, FileConfig, Severity, StorageMode, build_orchestrator,
};
use repl::{GameRepl, print_error, print_header, print_history, print_last_reply};
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Messages replayed when a saved session is resumed.
const RESUME_REPLAY: usize = 6;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    info!("Starting gameplan");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    if let Command::Config = cli.command {
        show_config(&config);
        return Ok(());
    }

    // === Dependency Injection ===
    let options = BootstrapOptions {
        user: cli.user.clone().map(UserId::new),
        storage: if cli.ephemeral {
            StorageMode::Ephemeral
        } else {
            StorageMode::Persistent
        },
        transcript: cli.log_dir.as_ref().map(|dir| dir.join("conversation.jsonl")),
    };
    let orchestrator = build_orchestrator(&config, options)?;

    let outcome = match cli.command {
        Command::Topics => {
            list_topics(&orchestrator);
            Ok(())
        }
        Command::Balance => orchestrator.open_account().await.map(|balance| {
            println!("Balance: {} credits", balance);
        }),
        Command::Play {
            topic,
            difficulty,
            provider,
        } => {
            let difficulty = match difficulty {
                Some(level) => level
                    .parse::<Difficulty>()
                    .map_err(|e| anyhow!("{}", e))?,
                None => config.session.parse_difficulty().0,
            };
            play(&orchestrator, &topic, difficulty, provider).await
        }
        Command::Resume { session_id } => resume(&orchestrator, &session_id).await,
        Command::Config => Ok(()),
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => {
            print_error(&e);
            drop(guard);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    let stderr = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "gameplan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            Ok(None)
        }
    }
}

fn list_topics(orchestrator: &GameOrchestrator) {
    println!();
    for topic in orchestrator.topics() {
        println!("  {:<20} {}", topic.id.to_string().cyan(), topic.name.bold());
        if !topic.description.is_empty() {
            println!("  {:<20} {}", "", topic.description.dimmed());
        }
    }
    println!();
}

async fn play(
    orchestrator: &GameOrchestrator,
    topic: &str,
    difficulty: Difficulty,
    provider: Option<String>,
) -> Result<(), GameError> {
    let balance = orchestrator.open_account().await?;
    println!("Balance: {} credits", balance);

    let session = orchestrator
        .start_session(&TopicId::new(topic), difficulty, provider.map(ProviderId::new))
        .await?;
    print_header(&session);
    print_last_reply(&session);

    GameRepl::new(orchestrator, &session)
        .run()
        .await
        .map_err(|e| GameError::Storage(e.to_string()))
}

async fn resume(orchestrator: &GameOrchestrator, session_id: &str) -> Result<(), GameError> {
    let session = orchestrator
        .load_session(&SessionId::new(session_id))
        .await?;
    print_header(&session);
    print_history(&session, RESUME_REPLAY);

    GameRepl::new(orchestrator, &session)
        .run()
        .await
        .map_err(|e| GameError::Storage(e.to_string()))
}

fn show_config(config: &FileConfig) {
    println!("Configuration sources (in priority order):");
    println!("  [     ] Env:     GAMEPLAN_* variables");
    for (label, path) in ConfigLoader::config_sources() {
        match path {
            Some(path) => println!("  [FOUND] {:<8} {}", format!("{}:", label), path.display()),
            None => println!("  [     ] {:<8} (none)", format!("{}:", label)),
        }
    }
    println!("  [     ] Default: built-in defaults");
    println!();
    println!(
        "Data directory: {}",
        config.storage.resolve_data_dir().display()
    );

    let issues = config.validate();
    if issues.is_empty() {
        println!("No configuration issues.");
    }
    for issue in issues {
        let label = match issue.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!("{}: {}", label, issue.message);
    }
}
