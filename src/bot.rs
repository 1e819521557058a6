//! Command layer and event pipeline around the tournament store.

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

use crate::classifier::{MessageClassifier, RejectReason, Verdict};
use crate::config::BotConfig;
use crate::directory::{NameCache, UserDirectory, resolve_name};
use crate::event::{ChatMessage, DiceEvent};
use crate::stats::{DEFAULT_TOP_N, ResultSummary, co_leaders, standings};
use crate::tournament::{
    ChatId, Ranking, Tournament, TournamentError, TournamentResult, TournamentStore, UserId,
};

/// A command the caller may not run or passed bad arguments to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum CommandError {
    /// No admin is configured, so admin commands are off.
    #[display("Admin commands are disabled")]
    AdminDisabled,

    /// The caller is not the configured admin.
    #[display("User {caller} is not the admin")]
    NotAdmin {
        /// Who tried.
        caller: UserId,
    },

    /// Requested duration outside `1..=max` minutes.
    #[display("Duration must be between 1 and {max} minutes, got {requested}")]
    InvalidDuration {
        /// Requested minutes.
        requested: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The store refused the transition.
    #[display("{}", _0)]
    Tournament(TournamentError),
}

impl From<TournamentError> for CommandError {
    fn from(err: TournamentError) -> Self {
        Self::Tournament(err)
    }
}

/// What happened to one inbound roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Processing is switched off.
    BotInactive,
    /// Forwarded or stale; `jackpot` tells whether the sender should be warned.
    Rejected {
        /// Why the message was rejected.
        reason: RejectReason,
        /// Whether the rejected roll was a jackpot.
        jackpot: bool,
    },
    /// A valid roll that missed.
    NoJackpot,
    /// A valid jackpot credited to the running tournament.
    Counted {
        /// Sender's count after this jackpot.
        score: u64,
    },
    /// A valid jackpot with no tournament running.
    UncountedJackpot,
}

/// One line of a report, with the name already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// 1-based place.
    pub place: usize,
    /// Player.
    pub user_id: UserId,
    /// Resolved display name or raw-id placeholder.
    pub name: String,
    /// Jackpots counted.
    pub wins: u64,
}

/// Everything a presentation layer needs to announce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentReport {
    /// Chat the tournament ran in.
    pub chat_id: ChatId,
    /// Chat title at start.
    pub chat_label: String,
    /// Totals and elapsed time.
    pub summary: ResultSummary,
    /// Top of the table.
    pub lines: Vec<ReportLine>,
    /// Players below the cut.
    pub remaining: usize,
    /// Players sharing the top count.
    pub co_leaders: Vec<UserId>,
}

/// Glues classifier, store and directory together behind the command set.
#[derive(Clone)]
pub struct JackpotBot {
    config: BotConfig,
    active: Arc<AtomicBool>,
    store: TournamentStore,
    classifier: MessageClassifier,
    names: Option<NameCache>,
    directory: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for JackpotBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JackpotBot")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl JackpotBot {
    /// Creates a bot over `store` that resolves names from what it has seen.
    #[instrument(skip(store))]
    pub fn new(config: BotConfig, store: TournamentStore) -> Self {
        let names = NameCache::new();
        let directory: Arc<dyn UserDirectory> = Arc::new(names.clone());
        Self::build(config, store, Some(names), directory)
    }

    /// Creates a bot that resolves names through an external directory.
    #[instrument(skip(store, directory))]
    pub fn with_directory(
        config: BotConfig,
        store: TournamentStore,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self::build(config, store, None, directory)
    }

    fn build(
        config: BotConfig,
        store: TournamentStore,
        names: Option<NameCache>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        info!(
            admin = ?config.admin_identity(),
            max_duration = config.max_tournament_duration_minutes(),
            freshness_limit = config.freshness_limit_seconds(),
            bot_active = config.bot_active(),
            "Creating jackpot bot"
        );
        Self {
            active: Arc::new(AtomicBool::new(*config.bot_active())),
            classifier: MessageClassifier::from_seconds(*config.freshness_limit_seconds()),
            config,
            store,
            names,
            directory,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &TournamentStore {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Names learned from events, when no external directory is in use.
    pub fn name_cache(&self) -> Option<&NameCache> {
        self.names.as_ref()
    }

    /// Returns true while inbound events are processed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn authorize(&self, caller: UserId) -> Result<(), CommandError> {
        match self.config.admin_identity() {
            None => {
                warn!(caller, "Admin command refused, no admin configured");
                Err(CommandError::AdminDisabled)
            }
            Some(admin) if *admin != caller => {
                warn!(caller, "Admin command refused");
                Err(CommandError::NotAdmin { caller })
            }
            Some(_) => Ok(()),
        }
    }

    /// Switches event processing on or off.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] unless `caller` is the admin.
    #[instrument(skip(self))]
    pub fn set_active(&self, caller: UserId, active: bool) -> Result<bool, CommandError> {
        self.authorize(caller)?;
        self.active.store(active, Ordering::SeqCst);
        info!(active, "Bot toggled");
        Ok(active)
    }

    /// Starts a tournament, optionally bounded to `duration_minutes`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the caller is not the admin, the duration
    /// is out of range, or a tournament is already running.
    #[instrument(skip(self, chat_label))]
    pub fn start_tournament(
        &self,
        caller: UserId,
        chat_id: ChatId,
        chat_label: String,
        duration_minutes: Option<u32>,
    ) -> Result<Tournament, CommandError> {
        self.authorize(caller)?;

        let max = *self.config.max_tournament_duration_minutes();
        if let Some(requested) = duration_minutes.filter(|m| !(1..=max).contains(m)) {
            warn!(requested, max, "Duration out of range");
            return Err(CommandError::InvalidDuration { requested, max });
        }

        Ok(self.store.start(chat_id, chat_label, duration_minutes)?)
    }

    /// Stops the tournament in `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the caller is not the admin or the chat
    /// has no tournament.
    #[instrument(skip(self))]
    pub fn stop_tournament(
        &self,
        caller: UserId,
        chat_id: ChatId,
    ) -> Result<TournamentResult, CommandError> {
        self.authorize(caller)?;
        Ok(self.store.stop(chat_id)?)
    }

    /// Current ranking for `chat_id`.
    #[instrument(skip(self))]
    pub fn query_stats(&self, chat_id: ChatId) -> Ranking {
        self.store.ranking(chat_id)
    }

    /// Converts a transport message and runs it through [`Self::handle_event`].
    ///
    /// Returns `None` for messages without a dice roll.
    #[instrument(skip(self, message), fields(chat_id = message.chat_id, user_id = message.user_id))]
    pub fn handle_message(
        &self,
        message: ChatMessage,
        observed_at: DateTime<Utc>,
    ) -> Option<EventOutcome> {
        let event = message.into_event()?;
        Some(self.handle_event(&event, observed_at))
    }

    /// Classifies one roll and credits it if it counts.
    #[instrument(skip(self, event), fields(chat_id = event.chat_id, user_id = event.user_id))]
    pub fn handle_event(&self, event: &DiceEvent, observed_at: DateTime<Utc>) -> EventOutcome {
        if !self.is_active() {
            debug!("Bot inactive, event ignored");
            return EventOutcome::BotInactive;
        }

        if let Some(names) = &self.names {
            names.remember(event.user_id, &event.user_display_name);
        }

        let verdict = self.classifier.classify(event, observed_at);
        if let Verdict::Rejected(reason) = verdict {
            if event.outcome_is_jackpot {
                warn!(%reason, "Jackpot not counted");
            }
            return EventOutcome::Rejected {
                reason,
                jackpot: event.outcome_is_jackpot,
            };
        }

        if !verdict.counts(event) {
            debug!(outcome = %event.outcome_kind, "No jackpot");
            return EventOutcome::NoJackpot;
        }

        match self.store.record_win(event.chat_id, event.user_id) {
            Some(score) => {
                info!(score, "Jackpot counted");
                EventOutcome::Counted { score }
            }
            None => {
                info!("Jackpot outside a tournament");
                EventOutcome::UncountedJackpot
            }
        }
    }

    /// Stops every tournament whose scheduled end is at or before `now`.
    #[instrument(skip(self))]
    pub fn stop_overdue(&self, now: DateTime<Utc>) -> Vec<TournamentResult> {
        let stopped = self.store.stop_overdue(now);
        for result in &stopped {
            info!(chat_id = result.tournament().chat_id(), "Scheduled end reached");
        }
        stopped
    }

    /// Builds a report for `result`, resolving names for the shown places.
    #[instrument(skip(self, result), fields(chat_id = result.tournament().chat_id()))]
    pub async fn report(&self, result: &TournamentResult) -> TournamentReport {
        let table = standings(result.player_stats(), DEFAULT_TOP_N);

        let mut lines = Vec::with_capacity(table.entries().len());
        for standing in table.entries() {
            lines.push(ReportLine {
                place: standing.place,
                user_id: standing.user_id,
                name: resolve_name(self.directory.as_ref(), standing.user_id).await,
                wins: standing.wins,
            });
        }

        TournamentReport {
            chat_id: *result.tournament().chat_id(),
            chat_label: result.tournament().chat_label().clone(),
            summary: ResultSummary::from_result(result),
            lines,
            remaining: *table.remaining(),
            co_leaders: co_leaders(result.player_stats()),
        }
    }
}
