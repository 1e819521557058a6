//! Jackpot Tournament - per-chat slot machine tournaments
//!
//! Tallies slot machine jackpots per player while a chat's tournament runs,
//! counting each fresh, original roll exactly once.
//!
//! # Architecture
//!
//! - **Event**: transport messages reduced to explicit roll events
//! - **Classifier**: forwarded/stale filtering
//! - **Tournament**: concurrency-safe per-chat store and history
//! - **Stats**: standings and result summaries
//! - **Backup**: JSON snapshots of the store
//! - **Bot**: admin commands and the event pipeline
//!
//! # Example
//!
//! ```
//! use jackpot_tournament::TournamentStore;
//!
//! let store = TournamentStore::new();
//! store.start(1, "Lobby".to_string(), Some(60)).unwrap();
//! store.record_win(1, 42);
//! let result = store.stop(1).unwrap();
//! assert_eq!(*result.total_wins(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod bot;
mod classifier;
mod config;
mod directory;
mod event;
mod stats;
mod tournament;

pub mod backup;
pub mod replay;

// Crate-level exports - Bot service
pub use bot::{CommandError, EventOutcome, JackpotBot, ReportLine, TournamentReport};

// Crate-level exports - Classifier
pub use classifier::{DEFAULT_FRESHNESS_LIMIT_SECONDS, MessageClassifier, RejectReason, Verdict};

// Crate-level exports - Configuration
pub use config::{BotConfig, ConfigError, DEFAULT_BACKUP_PATH, DEFAULT_MAX_TOURNAMENT_DURATION_MINUTES};

// Crate-level exports - Name lookups
pub use directory::{NameCache, UserDirectory, fallback_name, resolve_name};

// Crate-level exports - Events
pub use event::{
    ChatMessage, Dice, DiceEvent, ForwardInfo, ForwardMarker, JACKPOT_VALUE, SLOT_MACHINE_EMOJI,
    SlotSymbol,
};

// Crate-level exports - Stats
pub use stats::{DEFAULT_TOP_N, Elapsed, ResultSummary, Standing, Standings, co_leaders, standings};

// Crate-level exports - Tournament store
pub use tournament::{
    ChatId, PlayerTally, Ranking, StoreSnapshot, Tournament, TournamentError, TournamentResult,
    TournamentStatus, TournamentStore, UserId,
};
