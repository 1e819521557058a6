//! Read-side ranking and summary figures.

use chrono::TimeDelta;
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::tournament::{TournamentResult, UserId};

/// How many places a standings table shows by default.
pub const DEFAULT_TOP_N: usize = 10;

/// One row of a standings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based place; equal counts still get consecutive places.
    pub place: usize,
    /// Player.
    pub user_id: UserId,
    /// Jackpots counted for the player.
    pub wins: u64,
}

/// Top of a ranking plus how many players were cut off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Standings {
    entries: Vec<Standing>,
    remaining: usize,
}

impl Standings {
    /// Returns true if nobody has scored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Numbers the first `top_n` entries of a sorted ranking.
#[instrument(skip(ranking), fields(players = ranking.len()))]
pub fn standings(ranking: &[(UserId, u64)], top_n: usize) -> Standings {
    let entries: Vec<_> = ranking
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, &(user_id, wins))| Standing {
            place: i + 1,
            user_id,
            wins,
        })
        .collect();
    let remaining = ranking.len().saturating_sub(entries.len());

    debug!(shown = entries.len(), remaining, "Built standings");
    Standings { entries, remaining }
}

/// Leading entries that share the top count.
///
/// Empty for an empty ranking or one where the leader has no wins.
pub fn co_leaders(ranking: &[(UserId, u64)]) -> Vec<UserId> {
    let Some(&(_, top)) = ranking.first() else {
        return Vec::new();
    };
    if top == 0 {
        return Vec::new();
    }
    ranking
        .iter()
        .take_while(|(_, wins)| *wins == top)
        .map(|(user_id, _)| *user_id)
        .collect()
}

/// Elapsed time split into hours, minutes and seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize, Getters)]
#[display("{hours:02}:{minutes:02}:{seconds:02}")]
pub struct Elapsed {
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl Elapsed {
    /// Splits a duration, clamping negatives to zero.
    pub fn from_delta(delta: TimeDelta) -> Self {
        let total = delta.num_seconds().max(0);
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

/// Aggregate figures for a stopped tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ResultSummary {
    total_wins: u64,
    total_players: usize,
    elapsed: Elapsed,
}

impl ResultSummary {
    /// Summarizes a tournament result.
    #[instrument(skip(result), fields(chat_id = result.tournament().chat_id()))]
    pub fn from_result(result: &TournamentResult) -> Self {
        let tournament = result.tournament();
        let elapsed = match *tournament.ends_at() {
            Some(end) => Elapsed::from_delta(end - *tournament.started_at()),
            None => Elapsed::default(),
        };

        Self {
            total_wins: *result.total_wins(),
            total_players: *result.total_players(),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_display() {
        let elapsed = Elapsed::from_delta(TimeDelta::seconds(3 * 3600 + 7 * 60 + 9));
        assert_eq!(elapsed.to_string(), "03:07:09");
        assert_eq!(Elapsed::from_delta(TimeDelta::seconds(-5)).to_string(), "00:00:00");
    }
}
