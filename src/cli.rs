//! Command-line interface for jackpot_tournament.

use clap::{Parser, Subcommand};

/// Jackpot Tournament - per-chat slot machine tournaments
#[derive(Parser, Debug)]
#[command(name = "jackpot_tournament")]
#[command(about = "Counts slot machine jackpots per chat tournament", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay JSON-lines chat traffic through the bot
    Run {
        /// Input file; reads stdin if not provided
        #[arg(short, long)]
        events: Option<std::path::PathBuf>,

        /// TOML config file; environment variables are used if not provided
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Override the backup file
        #[arg(long)]
        backup: Option<std::path::PathBuf>,

        /// Do not restore history from the backup on startup
        #[arg(long)]
        no_restore: bool,
    },

    /// Print tournament history stored in a backup file
    History {
        /// Backup file to read
        #[arg(long, default_value = jackpot_tournament::DEFAULT_BACKUP_PATH)]
        backup: std::path::PathBuf,
    },
}
