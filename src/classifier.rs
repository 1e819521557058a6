//! Decides whether an inbound roll may count toward a tournament.

use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::event::DiceEvent;

/// Default maximum message age, in seconds.
pub const DEFAULT_FRESHNESS_LIMIT_SECONDS: u64 = 120;

/// Why a message was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// A forward marker was present.
    #[display("forwarded")]
    Forwarded,

    /// The message is older than the freshness limit.
    #[display("stale ({age_seconds}s old)")]
    Stale {
        /// Whole seconds between sending and observation.
        age_seconds: i64,
    },
}

/// Classifier output for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// An original, fresh message.
    Accepted,
    /// Not eligible for counting.
    Rejected(RejectReason),
}

impl Verdict {
    /// Returns true for an original, fresh message.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Rejection reason, if any.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// Returns true only for an accepted jackpot.
    pub fn counts(&self, event: &DiceEvent) -> bool {
        self.is_accepted() && event.outcome_is_jackpot
    }
}

/// Provenance and freshness filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageClassifier {
    freshness_limit: TimeDelta,
}

impl MessageClassifier {
    /// Creates a classifier with the given maximum message age.
    #[instrument]
    pub fn new(freshness_limit: TimeDelta) -> Self {
        Self { freshness_limit }
    }

    /// Creates a classifier with a limit in whole seconds.
    #[instrument]
    pub fn from_seconds(seconds: u64) -> Self {
        let limit = i64::try_from(seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self::new(limit)
    }

    /// Maximum accepted age.
    pub fn freshness_limit(&self) -> TimeDelta {
        self.freshness_limit
    }

    /// Classifies `event` as observed at `observed_at`.
    ///
    /// Forwarding is checked before age. An age equal to the limit is still
    /// fresh. A message without a send time is treated as fresh.
    #[instrument(skip(self, event), fields(chat_id = event.chat_id, user_id = event.user_id))]
    pub fn classify(&self, event: &DiceEvent, observed_at: DateTime<Utc>) -> Verdict {
        if event.is_forwarded {
            debug!("Rejected forwarded message");
            return Verdict::Rejected(RejectReason::Forwarded);
        }

        if let Some(sent_at) = event.sent_at {
            let age = observed_at - sent_at;
            if age > self.freshness_limit {
                debug!(age_seconds = age.num_seconds(), "Rejected stale message");
                return Verdict::Rejected(RejectReason::Stale {
                    age_seconds: age.num_seconds(),
                });
            }
        }

        Verdict::Accepted
    }
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self::from_seconds(DEFAULT_FRESHNESS_LIMIT_SECONDS)
    }
}
