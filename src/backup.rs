//! JSON backups of tournament state.
//!
//! A backup holds the active tournaments and the full history, but only the
//! history is restored. Tournaments that were running when the process went
//! down are considered abandoned.

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::tournament::{ChatId, StoreSnapshot, Tournament, TournamentResult, TournamentStore};

/// Backup error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Backup error: {} at {}:{}", message, file, line)]
pub struct BackupError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl BackupError {
    /// Creates a new backup error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for BackupError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for BackupError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

#[derive(Debug, Serialize)]
struct BackupDocument<'a> {
    active_tournaments: BTreeMap<ChatId, &'a Tournament>,
    tournament_history: &'a [TournamentResult],
    backup_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RestoredHistory {
    #[serde(default)]
    tournament_history: Vec<TournamentResult>,
}

/// Serializes a snapshot to the backup schema.
///
/// # Errors
///
/// Returns [`BackupError`] if serialization fails.
#[instrument(skip(snapshot), fields(active = snapshot.active().len(), history = snapshot.history().len()))]
pub fn encode(snapshot: &StoreSnapshot, backup_time: DateTime<Utc>) -> Result<String, BackupError> {
    let document = BackupDocument {
        active_tournaments: snapshot
            .active()
            .iter()
            .map(|t| (*t.chat_id(), t))
            .collect(),
        tournament_history: snapshot.history(),
        backup_time,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Reads the history out of a backup document.
///
/// A document without `tournament_history` yields an empty history.
///
/// # Errors
///
/// Returns [`BackupError`] if the text is not a valid backup.
#[instrument(skip(json), fields(bytes = json.len()))]
pub fn decode_history(json: &str) -> Result<Vec<TournamentResult>, BackupError> {
    let restored: RestoredHistory = serde_json::from_str(json)?;
    debug!(count = restored.tournament_history.len(), "Decoded history");
    Ok(restored.tournament_history)
}

/// Writes a backup of `store` to `path`.
///
/// The snapshot is taken first; no lock is held during file I/O.
///
/// # Errors
///
/// Returns [`BackupError`] if encoding or writing fails.
#[instrument(skip(store, path), fields(path = %path.as_ref().display()))]
pub fn save(store: &TournamentStore, path: impl AsRef<Path>) -> Result<(), BackupError> {
    let snapshot = store.snapshot();
    let json = encode(&snapshot, Utc::now())?;
    std::fs::write(path.as_ref(), json)?;
    info!(
        active = snapshot.active().len(),
        history = snapshot.history().len(),
        "Backup written"
    );
    Ok(())
}

/// Restores the history in `store` from the backup at `path`.
///
/// Returns false, leaving the history untouched, if the file is missing or
/// malformed.
#[instrument(skip(store, path), fields(path = %path.as_ref().display()))]
pub fn load(store: &TournamentStore, path: impl AsRef<Path>) -> bool {
    let history = std::fs::read_to_string(path.as_ref())
        .map_err(BackupError::from)
        .and_then(|json| decode_history(&json));

    match history {
        Ok(history) => {
            info!(count = history.len(), "Restored tournament history");
            store.restore_history(history);
            true
        }
        Err(e) => {
            warn!(error = %e, "Backup not restored, starting with empty history");
            false
        }
    }
}
