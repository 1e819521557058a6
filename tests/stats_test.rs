//! Tests for standings and result summaries.

use chrono::{TimeDelta, Utc};

use jackpot_tournament::{
    DEFAULT_TOP_N, ResultSummary, TournamentStore, co_leaders, standings,
};

#[test]
fn test_places_are_strictly_sequential() {
    let ranking = vec![(1, 5), (2, 5), (3, 2)];
    let table = standings(&ranking, DEFAULT_TOP_N);

    let places: Vec<_> = table.entries().iter().map(|s| s.place).collect();
    assert_eq!(places, vec![1, 2, 3]);
    assert_eq!(*table.remaining(), 0);
}

#[test]
fn test_top_n_truncation_counts_the_rest() {
    let ranking: Vec<_> = (0..14).map(|i| (i, 20 - i as u64)).collect();
    let table = standings(&ranking, DEFAULT_TOP_N);

    assert_eq!(table.entries().len(), 10);
    assert_eq!(*table.remaining(), 4);
    assert_eq!(table.entries()[9].place, 10);
    assert_eq!(table.entries()[9].user_id, 9);
}

#[test]
fn test_empty_ranking_has_empty_standings() {
    let table = standings(&[], DEFAULT_TOP_N);
    assert!(table.is_empty());
    assert_eq!(*table.remaining(), 0);
    assert!(co_leaders(&[]).is_empty());
}

#[test]
fn test_co_leaders_share_top_count() {
    assert_eq!(co_leaders(&[(4, 3), (9, 3), (2, 1)]), vec![4, 9]);
    assert_eq!(co_leaders(&[(4, 3), (9, 2)]), vec![4]);
}

#[test]
fn test_summary_from_result() {
    let store = TournamentStore::new();
    let start = Utc::now();
    store
        .start_at(1, "Lobby".to_string(), None, start)
        .expect("Start failed");
    store.record_win(1, 10);
    store.record_win(1, 10);
    store.record_win(1, 20);

    let stop = start + TimeDelta::seconds(3723);
    let result = store.stop_at(1, stop).expect("Stop failed");
    let summary = ResultSummary::from_result(&result);

    assert_eq!(*summary.total_wins(), 3);
    assert_eq!(*summary.total_players(), 2);
    assert_eq!(summary.elapsed().to_string(), "01:02:03");
}

#[test]
fn test_summary_totals_match_player_stats() {
    let store = TournamentStore::new();
    store.start(1, "Lobby".to_string(), None).expect("Start failed");
    for user in [1, 2, 3, 2, 3, 3] {
        store.record_win(1, user);
    }
    let result = store.stop(1).expect("Stop failed");

    let summed: u64 = result.player_stats().iter().map(|(_, wins)| wins).sum();
    assert_eq!(*result.total_wins(), summed);
    assert_eq!(*result.total_players(), result.player_stats().len());
    assert_eq!(result.player_stats(), &vec![(3, 3), (2, 2), (1, 1)]);
}
