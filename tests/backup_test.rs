//! Tests for the backup codec.

use chrono::{TimeDelta, Utc};
use std::io::Write;
use tempfile::NamedTempFile;

use jackpot_tournament::{TournamentStore, backup};

/// Store with one archived and one running tournament.
fn populated_store() -> TournamentStore {
    let store = TournamentStore::new();
    let start = Utc::now() - TimeDelta::minutes(10);

    store
        .start_at(-100200, "Archived".to_string(), Some(30), start)
        .expect("Start failed");
    store.record_win(-100200, 7);
    store.record_win(-100200, 8);
    store.record_win(-100200, 8);
    store
        .stop_at(-100200, start + TimeDelta::minutes(5))
        .expect("Stop failed");

    store
        .start(-100300, "Running".to_string(), None)
        .expect("Start failed");
    store.record_win(-100300, 9);
    store
}

#[test]
fn test_encode_schema() {
    let store = populated_store();
    let json = backup::encode(&store.snapshot(), Utc::now()).expect("Encode failed");
    let value: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");

    let active = value["active_tournaments"]
        .as_object()
        .expect("active_tournaments should be an object");
    assert_eq!(active.len(), 1);
    assert_eq!(active["-100300"]["status"], "active");
    assert_eq!(active["-100300"]["event_count"], 1);

    let history = value["tournament_history"]
        .as_array()
        .expect("tournament_history should be an array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["total_wins"], 3);
    assert_eq!(history[0]["total_players"], 2);
    assert_eq!(history[0]["player_stats"]["8"], 2);
    assert_eq!(history[0]["tournament_data"]["status"], "stopped");
    assert!(history[0]["tournament_data"]["started_at"].is_string());

    assert!(value["backup_time"].is_string());
}

#[test]
fn test_decode_keeps_history_and_ranking_order() {
    let store = populated_store();
    let json = backup::encode(&store.snapshot(), Utc::now()).expect("Encode failed");

    let history = backup::decode_history(&json).expect("Decode failed");
    assert_eq!(history, store.history());
    assert_eq!(history[0].player_stats(), &vec![(8, 2), (7, 1)]);
}

#[test]
fn test_decode_without_history_is_empty() {
    let history = backup::decode_history(r#"{"backup_time":"2026-01-01T00:00:00Z"}"#)
        .expect("Decode failed");
    assert!(history.is_empty());
}

#[test]
fn test_save_then_load_restores_history_only() {
    let store = populated_store();
    let file = NamedTempFile::new().expect("Failed to create temp file");
    backup::save(&store, file.path()).expect("Save failed");

    let restored = TournamentStore::new();
    assert!(backup::load(&restored, file.path()));
    assert_eq!(restored.history(), store.history());
    assert!(restored.list_active().is_empty());
    assert!(!restored.is_active(-100300));
}

#[test]
fn test_load_missing_file_is_non_fatal() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = TournamentStore::new();
    assert!(!backup::load(&store, dir.path().join("absent.json")));
    assert!(store.history().is_empty());
}

#[test]
fn test_load_corrupt_file_is_non_fatal() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(b"{ not json").expect("Write failed");

    let store = TournamentStore::new();
    assert!(!backup::load(&store, file.path()));
    assert!(store.history().is_empty());
}
