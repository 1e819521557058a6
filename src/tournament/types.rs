//! Tournament records, tallies and final results.

use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{instrument, warn};

/// Chat identifier as delivered by the transport.
pub type ChatId = i64;

/// User identifier as delivered by the transport.
pub type UserId = i64;

/// Players ordered by win count, highest first.
pub type Ranking = Vec<(UserId, u64)>;

/// Lifecycle state of a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TournamentStatus {
    /// Jackpots are being counted.
    Active,
    /// Closed by `stop`; only ever seen inside a [`TournamentResult`].
    Stopped,
}

/// A scoring window for one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Tournament {
    /// Chat the tournament runs in.
    chat_id: ChatId,
    /// Chat title at the time the tournament started.
    chat_label: String,
    /// When the tournament started.
    started_at: DateTime<Utc>,
    /// Scheduled end while active, actual stop time once stopped.
    ends_at: Option<DateTime<Utc>>,
    /// Requested length in minutes, if bounded.
    duration_minutes: Option<u32>,
    /// Lifecycle state.
    status: TournamentStatus,
    /// Countable events observed while active.
    event_count: u64,
}

impl Tournament {
    /// Opens a new active tournament at `now`.
    #[instrument(skip(chat_label))]
    pub(crate) fn begin(
        chat_id: ChatId,
        chat_label: String,
        duration_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Self {
        let ends_at = duration_minutes.and_then(|minutes| {
            let end = now.checked_add_signed(TimeDelta::minutes(i64::from(minutes)));
            if end.is_none() {
                warn!(chat_id, minutes, "Scheduled end out of range, running unbounded");
            }
            end
        });

        Self {
            chat_id,
            chat_label,
            started_at: now,
            ends_at,
            duration_minutes,
            status: TournamentStatus::Active,
            event_count: 0,
        }
    }

    /// Returns true while jackpots are being counted.
    pub fn is_active(&self) -> bool {
        self.status == TournamentStatus::Active
    }

    /// Returns true if the scheduled end is at or before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.ends_at.is_some_and(|end| end <= now)
    }

    /// Time between start and end, or start and `now` if still open.
    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        let end = match self.status {
            TournamentStatus::Active => now,
            TournamentStatus::Stopped => self.ends_at.unwrap_or(now),
        };
        end - self.started_at
    }

    pub(crate) fn count_event(&mut self) {
        self.event_count += 1;
    }

    /// Closes the tournament, overriding any scheduled end with `now`.
    pub(crate) fn finish(mut self, now: DateTime<Utc>) -> Self {
        self.status = TournamentStatus::Stopped;
        self.ends_at = Some(now);
        self
    }
}

/// Win counts for one chat, remembering the order players first scored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTally {
    entries: Vec<(UserId, u64)>,
    index: HashMap<UserId, usize>,
}

impl PlayerTally {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one win for `user_id` and returns the new count.
    pub fn increment(&mut self, user_id: UserId) -> u64 {
        match self.index.get(&user_id) {
            Some(&slot) => {
                let entry = &mut self.entries[slot];
                entry.1 += 1;
                entry.1
            }
            None => {
                self.index.insert(user_id, self.entries.len());
                self.entries.push((user_id, 1));
                1
            }
        }
    }

    /// Current count for `user_id`.
    pub fn get(&self, user_id: UserId) -> Option<u64> {
        self.index.get(&user_id).map(|&slot| self.entries[slot].1)
    }

    /// Number of distinct players.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nobody has scored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, wins)| wins).sum()
    }

    /// Counts sorted descending; equal counts keep first-scored order.
    pub fn ranking(&self) -> Ranking {
        let mut ranking = self.entries.clone();
        ranking.sort_by(|a, b| b.1.cmp(&a.1));
        ranking
    }
}

/// Immutable record of a stopped tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct TournamentResult {
    /// The tournament as it was when stopped.
    #[serde(rename = "tournament_data")]
    tournament: Tournament,
    /// Final ranking, highest count first.
    #[serde(with = "ranking_map")]
    player_stats: Ranking,
    /// Sum of all counts.
    total_wins: u64,
    /// Number of distinct players who scored.
    total_players: usize,
}

impl TournamentResult {
    /// Builds the final record from a stopped tournament and its tally.
    pub(crate) fn new(tournament: Tournament, tally: &PlayerTally) -> Self {
        Self {
            tournament,
            player_stats: tally.ranking(),
            total_wins: tally.total(),
            total_players: tally.len(),
        }
    }
}

/// Serializes a ranking as a JSON object keyed by user id, in ranking order.
mod ranking_map {
    use super::{Ranking, UserId};
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(ranking: &Ranking, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ranking.len()))?;
        for (user_id, wins) in ranking {
            map.serialize_entry(user_id, wins)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ranking, D::Error> {
        deserializer.deserialize_map(RankingVisitor)
    }

    struct RankingVisitor;

    impl<'de> Visitor<'de> for RankingVisitor {
        type Value = Ranking;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of user ids to win counts")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Ranking, A::Error> {
            let mut ranking = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<UserId, u64>()? {
                ranking.push(entry);
            }
            Ok(ranking)
        }
    }
}
