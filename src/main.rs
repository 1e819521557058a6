//! Jackpot Tournament - replay CLI
//!
//! Feeds JSON-lines chat traffic through the bot and prints one JSON reply
//! per line on stdout. Logs go to stderr.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Command};
use jackpot_tournament::replay::{self, Reply};
use jackpot_tournament::{BotConfig, JackpotBot, ResultSummary, TournamentStore, backup};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info, instrument, warn};
use tracing_subscriber::EnvFilter;

/// How often scheduled tournament ends are checked.
const EXPIRY_TICK: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            events,
            config,
            backup,
            no_restore,
        } => run(events, config, backup, no_restore).await,
        Command::History { backup } => show_history(backup),
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Replay chat traffic until end of input or Ctrl-C, then write a backup.
#[instrument(skip_all)]
async fn run(
    events: Option<PathBuf>,
    config_path: Option<PathBuf>,
    backup_path: Option<PathBuf>,
    no_restore: bool,
) -> Result<()> {
    let config = match &config_path {
        Some(path) => BotConfig::from_file(path)?,
        None => BotConfig::from_env()?,
    };
    let config = match backup_path {
        Some(path) => config.with_backup_path(path),
        None => config,
    };

    init_tracing(config.log_level());
    // Repeat now that a subscriber is listening.
    config.validate()?;

    info!("🎰 Jackpot tournament bot starting");
    info!(admin = ?config.admin_identity(), "👑 Admin");
    info!(minutes = config.max_tournament_duration_minutes(), "📊 Max tournament duration");
    info!(seconds = config.freshness_limit_seconds(), "⏰ Freshness limit");
    info!(active = config.bot_active(), "🔌 Bot status");

    let store = TournamentStore::new();
    if !no_restore {
        backup::load(&store, config.backup_path());
    }
    let bot = JackpotBot::new(config.clone(), store);

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &events {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(reader).lines();
    let mut ticker = tokio::time::interval(EXPIRY_TICK);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("⏳ Waiting for messages");
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&bot, &line).await,
                Ok(None) => {
                    info!("End of input");
                    break;
                }
                Err(e) => {
                    // Results stopped so far still go to the backup.
                    error!(error = %e, "Failed to read input, shutting down");
                    break;
                }
            },
            _ = ticker.tick() => {
                for reply in replay::expire(&bot, Utc::now()).await {
                    emit(&reply);
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let store = bot.store().clone();
    let path = config.backup_path().clone();
    tokio::task::spawn_blocking(move || backup::save(&store, path)).await??;

    Ok(())
}

async fn handle_line(bot: &JackpotBot, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match replay::parse_line(line) {
        Ok(inbound) => {
            let reply = replay::apply(bot, inbound, Utc::now()).await;
            emit(&reply);
        }
        Err(e) => warn!(error = %e, "Skipping malformed input line"),
    }
}

fn emit(reply: &Reply) {
    match serde_json::to_string(reply) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "Failed to serialize reply"),
    }
}

/// Print every archived tournament with its summary.
#[instrument(skip_all, fields(path = %path.display()))]
fn show_history(path: PathBuf) -> Result<()> {
    init_tracing("warn");

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let history = backup::decode_history(&json)?;

    for result in &history {
        let line = serde_json::json!({
            "chat_id": result.tournament().chat_id(),
            "chat_label": result.tournament().chat_label(),
            "started_at": result.tournament().started_at(),
            "summary": ResultSummary::from_result(result),
            "player_stats": result.player_stats(),
        });
        println!("{}", line);
    }
    info!(count = history.len(), "History printed");

    Ok(())
}
