//! Concurrency-safe store of live tournaments and their history.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

use crate::tournament::{
    ChatId, PlayerTally, Ranking, Tournament, TournamentError, TournamentResult, UserId,
};

#[derive(Debug, Default)]
struct StoreState {
    tournaments: HashMap<ChatId, Tournament>,
    tallies: HashMap<ChatId, PlayerTally>,
    history: Vec<TournamentResult>,
}

impl StoreState {
    /// Moves the tournament for `chat_id` into history.
    fn finish(&mut self, chat_id: ChatId, now: DateTime<Utc>) -> Option<TournamentResult> {
        let tournament = self.tournaments.remove(&chat_id)?;
        let tally = self.tallies.remove(&chat_id).unwrap_or_default();

        let result = TournamentResult::new(tournament.finish(now), &tally);
        self.history.push(result.clone());

        info!(
            chat_id,
            total_wins = result.total_wins(),
            total_players = result.total_players(),
            "Tournament stopped"
        );
        Some(result)
    }
}

/// Consistent copy of the store taken under a single read lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct StoreSnapshot {
    /// Tournaments that were active, ordered by chat id.
    active: Vec<Tournament>,
    /// Every stopped tournament, oldest first.
    history: Vec<TournamentResult>,
}

/// Authoritative keeper of per-chat tournament state.
///
/// Cloning yields another handle to the same state. `start`, `stop` and
/// `record_win` each run under one write lock for their whole
/// read-modify-write, so no two of them interleave for any chat. Queries
/// take the read lock and never see a half-applied mutation.
#[derive(Debug, Clone, Default)]
pub struct TournamentStore {
    state: Arc<RwLock<StoreState>>,
}

impl TournamentStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating tournament store");
        Self::default()
    }

    // Poison is ignored; no mutation below can unwind halfway.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a tournament in `chat_id` now.
    ///
    /// # Errors
    ///
    /// Returns [`TournamentError::AlreadyActive`] without touching the
    /// existing tournament if one is already running.
    pub fn start(
        &self,
        chat_id: ChatId,
        chat_label: String,
        duration_minutes: Option<u32>,
    ) -> Result<Tournament, TournamentError> {
        self.start_at(chat_id, chat_label, duration_minutes, Utc::now())
    }

    /// Starts a tournament with an explicit start time.
    ///
    /// # Errors
    ///
    /// Returns [`TournamentError::AlreadyActive`] if one is already running.
    #[instrument(skip(self, chat_label))]
    pub fn start_at(
        &self,
        chat_id: ChatId,
        chat_label: String,
        duration_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Tournament, TournamentError> {
        let mut state = self.write();

        if state.tournaments.get(&chat_id).is_some_and(Tournament::is_active) {
            warn!(chat_id, "Tournament already active");
            return Err(TournamentError::AlreadyActive { chat_id });
        }

        let tournament = Tournament::begin(chat_id, chat_label, duration_minutes, now);
        state.tournaments.insert(chat_id, tournament.clone());
        state.tallies.insert(chat_id, PlayerTally::new());

        info!(chat_id, ends_at = ?tournament.ends_at(), "Tournament started");
        Ok(tournament)
    }

    /// Stops the tournament in `chat_id` now and archives its result.
    ///
    /// # Errors
    ///
    /// Returns [`TournamentError::NotFound`] with no state change if the chat
    /// has no tournament.
    pub fn stop(&self, chat_id: ChatId) -> Result<TournamentResult, TournamentError> {
        self.stop_at(chat_id, Utc::now())
    }

    /// Stops the tournament with an explicit stop time.
    ///
    /// # Errors
    ///
    /// Returns [`TournamentError::NotFound`] if the chat has no tournament.
    #[instrument(skip(self))]
    pub fn stop_at(
        &self,
        chat_id: ChatId,
        now: DateTime<Utc>,
    ) -> Result<TournamentResult, TournamentError> {
        self.write().finish(chat_id, now).ok_or_else(|| {
            debug!(chat_id, "No tournament to stop");
            TournamentError::NotFound { chat_id }
        })
    }

    /// Stops every tournament whose scheduled end is at or before `now`.
    ///
    /// Each deadline is checked under the same write lock that stops it.
    #[instrument(skip(self))]
    pub fn stop_overdue(&self, now: DateTime<Utc>) -> Vec<TournamentResult> {
        let mut state = self.write();
        let mut due: Vec<_> = state
            .tournaments
            .values()
            .filter(|t| t.is_overdue(now))
            .map(|t| *t.chat_id())
            .collect();
        due.sort_unstable();

        due.into_iter()
            .filter_map(|chat_id| state.finish(chat_id, now))
            .collect()
    }

    /// Credits one jackpot to `user_id` and returns their new count.
    ///
    /// Returns `None` and changes nothing if the chat has no active
    /// tournament.
    #[instrument(skip(self))]
    pub fn record_win(&self, chat_id: ChatId, user_id: UserId) -> Option<u64> {
        let mut state = self.write();
        let StoreState {
            tournaments,
            tallies,
            ..
        } = &mut *state;

        let Some(tournament) = tournaments.get_mut(&chat_id).filter(|t| t.is_active()) else {
            debug!(chat_id, user_id, "No active tournament, win not recorded");
            return None;
        };

        let wins = tallies.entry(chat_id).or_default().increment(user_id);
        tournament.count_event();

        debug!(chat_id, user_id, wins, event_count = tournament.event_count(), "Win recorded");
        Some(wins)
    }

    /// Returns true if `chat_id` has an active tournament.
    #[instrument(skip(self))]
    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.read()
            .tournaments
            .get(&chat_id)
            .is_some_and(Tournament::is_active)
    }

    /// Returns a copy of the live tournament for `chat_id`.
    #[instrument(skip(self))]
    pub fn tournament(&self, chat_id: ChatId) -> Option<Tournament> {
        self.read().tournaments.get(&chat_id).cloned()
    }

    /// Current ranking for `chat_id`, empty if nothing is tracked.
    #[instrument(skip(self))]
    pub fn ranking(&self, chat_id: ChatId) -> Ranking {
        self.read()
            .tallies
            .get(&chat_id)
            .map(PlayerTally::ranking)
            .unwrap_or_default()
    }

    /// Current count for one player.
    #[instrument(skip(self))]
    pub fn score(&self, chat_id: ChatId, user_id: UserId) -> Option<u64> {
        self.read().tallies.get(&chat_id)?.get(user_id)
    }

    /// All active tournaments, ordered by chat id.
    #[instrument(skip(self))]
    pub fn list_active(&self) -> Vec<Tournament> {
        let mut active: Vec<_> = self
            .read()
            .tournaments
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|t| *t.chat_id());
        debug!(count = active.len(), "Listed active tournaments");
        active
    }

    /// Chats whose scheduled end is at or before `now`.
    #[instrument(skip(self))]
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<ChatId> {
        let mut due: Vec<_> = self
            .read()
            .tournaments
            .values()
            .filter(|t| t.is_overdue(now))
            .map(|t| *t.chat_id())
            .collect();
        due.sort_unstable();
        due
    }

    /// Every stopped tournament, oldest first.
    #[instrument(skip(self))]
    pub fn history(&self) -> Vec<TournamentResult> {
        self.read().history.clone()
    }

    /// Copies active tournaments and history under one read lock.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.read();
        let mut active: Vec<_> = state
            .tournaments
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|t| *t.chat_id());

        StoreSnapshot {
            active,
            history: state.history.clone(),
        }
    }

    /// Replaces the history with one loaded from a backup.
    #[instrument(skip(self, history), fields(count = history.len()))]
    pub fn restore_history(&self, history: Vec<TournamentResult>) {
        let mut state = self.write();
        if !state.history.is_empty() {
            warn!(discarded = state.history.len(), "Replacing non-empty history");
        }
        state.history = history;
        info!("History restored");
    }
}
