//! Tests for the tournament store lifecycle and concurrency.

use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::thread;

use jackpot_tournament::{TournamentError, TournamentStatus, TournamentStore};

const ALICE: i64 = 101;
const BOB: i64 = 202;

#[test]
fn test_scenario_ranking_and_totals() {
    let store = TournamentStore::new();
    store
        .start(1, "Lobby".to_string(), Some(60))
        .expect("Start failed");

    for _ in 0..3 {
        store.record_win(1, ALICE).expect("Win not recorded");
    }
    store.record_win(1, BOB).expect("Win not recorded");

    let result = store.stop(1).expect("Stop failed");
    assert_eq!(result.player_stats(), &vec![(ALICE, 3), (BOB, 1)]);
    assert_eq!(*result.total_wins(), 4);
    assert_eq!(*result.total_players(), 2);
    assert_eq!(*result.tournament().event_count(), 4);
    assert_eq!(*result.tournament().status(), TournamentStatus::Stopped);
}

#[test]
fn test_immediate_stop_is_empty() {
    let store = TournamentStore::new();
    store.start(2, "Quiet".to_string(), None).expect("Start failed");

    let result = store.stop(2).expect("Stop failed");
    assert!(result.player_stats().is_empty());
    assert_eq!(*result.total_wins(), 0);
    assert_eq!(*result.total_players(), 0);
}

#[test]
fn test_stop_without_start_is_not_found() {
    let store = TournamentStore::new();
    let result = store.stop(99);
    assert_eq!(result, Err(TournamentError::NotFound { chat_id: 99 }));
    assert!(store.history().is_empty());
    assert!(store.list_active().is_empty());
}

#[test]
fn test_start_twice_keeps_existing_tally() {
    let store = TournamentStore::new();
    let first = store
        .start(1, "Lobby".to_string(), Some(30))
        .expect("Start failed");
    store.record_win(1, ALICE);

    let second = store.start(1, "Other".to_string(), None);
    assert_eq!(second, Err(TournamentError::AlreadyActive { chat_id: 1 }));

    let current = store.tournament(1).expect("Tournament missing");
    assert_eq!(current.started_at(), first.started_at());
    assert_eq!(current.chat_label(), "Lobby");
    assert_eq!(*current.event_count(), 1);
    assert_eq!(store.ranking(1), vec![(ALICE, 1)]);
}

#[test]
fn test_record_win_without_tournament_is_noop() {
    let store = TournamentStore::new();
    assert_eq!(store.record_win(5, ALICE), None);
    assert!(store.ranking(5).is_empty());
    assert!(!store.is_active(5));
}

#[test]
fn test_record_win_returns_running_score() {
    let store = TournamentStore::new();
    store.start(1, "Lobby".to_string(), None).expect("Start failed");
    assert_eq!(store.record_win(1, ALICE), Some(1));
    assert_eq!(store.record_win(1, BOB), Some(1));
    assert_eq!(store.record_win(1, ALICE), Some(2));
    assert_eq!(store.score(1, ALICE), Some(2));
    assert_eq!(store.score(1, 999), None);
}

#[test]
fn test_stop_clears_live_state() {
    let store = TournamentStore::new();
    store.start(1, "Lobby".to_string(), None).expect("Start failed");
    store.record_win(1, ALICE);
    store.stop(1).expect("Stop failed");

    assert!(!store.is_active(1));
    assert!(store.tournament(1).is_none());
    assert!(store.ranking(1).is_empty());
    assert_eq!(store.record_win(1, ALICE), None);
    assert_eq!(store.stop(1), Err(TournamentError::NotFound { chat_id: 1 }));
}

#[test]
fn test_restart_after_stop_is_fresh() {
    let store = TournamentStore::new();
    store.start(1, "Lobby".to_string(), None).expect("Start failed");
    store.record_win(1, ALICE);
    store.stop(1).expect("Stop failed");

    store.start(1, "Lobby".to_string(), None).expect("Restart failed");
    assert!(store.ranking(1).is_empty());
    assert_eq!(*store.tournament(1).expect("Missing").event_count(), 0);
    assert_eq!(store.history().len(), 1);
}

#[test]
fn test_ties_keep_first_seen_order() {
    let store = TournamentStore::new();
    store.start(1, "Lobby".to_string(), None).expect("Start failed");
    store.record_win(1, BOB);
    store.record_win(1, ALICE);
    store.record_win(1, 303);
    store.record_win(1, 303);

    assert_eq!(store.ranking(1), vec![(303, 2), (BOB, 1), (ALICE, 1)]);
}

#[test]
fn test_stop_overrides_scheduled_end() {
    let store = TournamentStore::new();
    let start = Utc::now();
    store
        .start_at(1, "Lobby".to_string(), Some(60), start)
        .expect("Start failed");
    assert_eq!(
        *store.tournament(1).expect("Missing").ends_at(),
        Some(start + TimeDelta::minutes(60))
    );

    let stop = start + TimeDelta::minutes(5);
    let result = store.stop_at(1, stop).expect("Stop failed");
    assert_eq!(*result.tournament().ends_at(), Some(stop));
    assert_eq!(*result.tournament().duration_minutes(), Some(60));
}

#[test]
fn test_unbounded_tournament_has_no_end() {
    let store = TournamentStore::new();
    let tournament = store.start(1, "Lobby".to_string(), None).expect("Start failed");
    assert!(tournament.ends_at().is_none());
    assert!(tournament.duration_minutes().is_none());
    assert!(store.overdue(Utc::now() + TimeDelta::days(365)).is_empty());
}

#[test]
fn test_overdue_lists_only_expired() {
    let store = TournamentStore::new();
    let start = Utc::now();
    store.start_at(1, "Short".to_string(), Some(1), start).expect("Start failed");
    store.start_at(2, "Long".to_string(), Some(60), start).expect("Start failed");
    store.start_at(3, "Open".to_string(), None, start).expect("Start failed");

    assert!(store.overdue(start).is_empty());
    assert_eq!(store.overdue(start + TimeDelta::minutes(1)), vec![1]);
    assert_eq!(store.overdue(start + TimeDelta::hours(2)), vec![1, 2]);
}

#[test]
fn test_stop_overdue_finishes_only_expired() {
    let store = TournamentStore::new();
    let start = Utc::now();
    store.start_at(1, "Short".to_string(), Some(1), start).expect("Start failed");
    store.start_at(2, "Long".to_string(), Some(60), start).expect("Start failed");
    store.start_at(3, "Open".to_string(), None, start).expect("Start failed");
    store.record_win(1, ALICE);

    assert!(store.stop_overdue(start).is_empty());

    let now = start + TimeDelta::minutes(2);
    let stopped = store.stop_overdue(now);
    assert_eq!(stopped.len(), 1);
    assert_eq!(*stopped[0].tournament().chat_id(), 1);
    assert_eq!(*stopped[0].tournament().ends_at(), Some(now));
    assert_eq!(stopped[0].player_stats(), &vec![(ALICE, 1)]);

    assert!(!store.is_active(1));
    assert!(store.is_active(2));
    assert!(store.is_active(3));
    assert_eq!(store.history(), stopped);
}

#[test]
fn test_list_active_sorted_by_chat() {
    let store = TournamentStore::new();
    store.start(30, "C".to_string(), None).expect("Start failed");
    store.start(10, "A".to_string(), None).expect("Start failed");
    store.start(20, "B".to_string(), None).expect("Start failed");
    store.stop(20).expect("Stop failed");

    let chats: Vec<_> = store.list_active().iter().map(|t| *t.chat_id()).collect();
    assert_eq!(chats, vec![10, 30]);
}

#[test]
fn test_history_is_append_only() {
    let store = TournamentStore::new();
    for chat in [3, 1, 2] {
        store.start(chat, format!("Chat {chat}"), None).expect("Start failed");
        store.stop(chat).expect("Stop failed");
    }

    let chats: Vec<_> = store
        .history()
        .iter()
        .map(|r| *r.tournament().chat_id())
        .collect();
    assert_eq!(chats, vec![3, 1, 2]);
}

#[test]
fn test_concurrent_wins_are_not_lost() {
    let store = Arc::new(TournamentStore::new());
    store.start(1, "Lobby".to_string(), None).expect("Start failed");

    let threads = 8;
    let per_thread = 250;
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..per_thread {
                    store.record_win(1, ALICE);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let expected = (threads * per_thread) as u64;
    assert_eq!(store.score(1, ALICE), Some(expected));
    let result = store.stop(1).expect("Stop failed");
    assert_eq!(*result.total_wins(), expected);
    assert_eq!(*result.tournament().event_count(), expected);
}

#[test]
fn test_concurrent_starts_yield_one_active() {
    let store = TournamentStore::new();
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || store.start(7, format!("Attempt {i}"), None).is_ok())
        })
        .collect();
    let started = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .filter(|ok| *ok)
        .count();

    assert_eq!(started, 1);
    assert_eq!(store.list_active().len(), 1);
}

#[test]
fn test_wins_racing_stop_are_counted_exactly_once() {
    let store = TournamentStore::new();
    store.start(1, "Lobby".to_string(), None).expect("Start failed");

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                (0..500)
                    .filter(|_| store.record_win(1, 1000 + i).is_some())
                    .count() as u64
            })
        })
        .collect();
    let stopper = {
        let store = store.clone();
        thread::spawn(move || {
            thread::yield_now();
            store.stop(1).expect("Stop failed")
        })
    };

    let recorded: u64 = writers
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .sum();
    let result = stopper.join().expect("Thread panicked");

    assert_eq!(*result.total_wins(), recorded);
    assert_eq!(*result.tournament().event_count(), recorded);
    let summed: u64 = result.player_stats().iter().map(|(_, wins)| wins).sum();
    assert_eq!(summed, recorded);
}
