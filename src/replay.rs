//! JSON-lines replay of chat traffic through a [`JackpotBot`].
//!
//! Each input line is one [`Inbound`] item tagged by `"type"`; each produces
//! one [`Reply`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::bot::{EventOutcome, JackpotBot, TournamentReport};
use crate::event::ChatMessage;
use crate::stats::{DEFAULT_TOP_N, Standings, standings};
use crate::tournament::{ChatId, Tournament, UserId};

/// One line of replay input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// A chat message, possibly carrying a roll.
    Message(ChatMessage),
    /// `StartTournament`.
    Start {
        /// Who issued the command.
        caller: UserId,
        /// Target chat.
        chat_id: ChatId,
        /// Chat title.
        #[serde(default)]
        chat_label: String,
        /// Optional bound in minutes.
        #[serde(default)]
        duration_minutes: Option<u32>,
    },
    /// `StopTournament`.
    Stop {
        /// Who issued the command.
        caller: UserId,
        /// Target chat.
        chat_id: ChatId,
    },
    /// `QueryStats`.
    Stats {
        /// Target chat.
        chat_id: ChatId,
    },
    /// Turn event processing on.
    Active {
        /// Who issued the command.
        caller: UserId,
    },
    /// Turn event processing off.
    Inactive {
        /// Who issued the command.
        caller: UserId,
    },
}

/// One line of replay output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    /// Result of processing a roll.
    Event {
        /// Chat of the roll.
        chat_id: ChatId,
        /// Sender of the roll.
        user_id: UserId,
        /// What happened.
        outcome: EventOutcome,
    },
    /// The message carried no roll.
    Skipped {
        /// Chat of the message.
        chat_id: ChatId,
    },
    /// A tournament was started.
    Started {
        /// The new tournament.
        tournament: Tournament,
    },
    /// A tournament was stopped by command.
    Stopped {
        /// Final report.
        report: TournamentReport,
    },
    /// A tournament reached its scheduled end.
    Expired {
        /// Final report.
        report: TournamentReport,
    },
    /// Current standings.
    Stats {
        /// Target chat.
        chat_id: ChatId,
        /// Whether a tournament is running.
        active: bool,
        /// Top of the table.
        standings: Standings,
    },
    /// Event processing was toggled.
    Toggled {
        /// New state.
        bot_active: bool,
    },
    /// A command was refused.
    Refused {
        /// Human-readable reason.
        error: String,
    },
}

/// Applies one inbound item at `now`.
#[instrument(skip(bot, inbound))]
pub async fn apply(bot: &JackpotBot, inbound: Inbound, now: DateTime<Utc>) -> Reply {
    match inbound {
        Inbound::Message(message) => {
            let (chat_id, user_id) = (message.chat_id, message.user_id);
            match bot.handle_message(message, now) {
                Some(outcome) => Reply::Event {
                    chat_id,
                    user_id,
                    outcome,
                },
                None => Reply::Skipped { chat_id },
            }
        }
        Inbound::Start {
            caller,
            chat_id,
            chat_label,
            duration_minutes,
        } => match bot.start_tournament(caller, chat_id, chat_label, duration_minutes) {
            Ok(tournament) => Reply::Started { tournament },
            Err(e) => refused(e),
        },
        Inbound::Stop { caller, chat_id } => match bot.stop_tournament(caller, chat_id) {
            Ok(result) => Reply::Stopped {
                report: bot.report(&result).await,
            },
            Err(e) => refused(e),
        },
        Inbound::Stats { chat_id } => Reply::Stats {
            chat_id,
            active: bot.store().is_active(chat_id),
            standings: standings(&bot.query_stats(chat_id), DEFAULT_TOP_N),
        },
        Inbound::Active { caller } => toggle(bot, caller, true),
        Inbound::Inactive { caller } => toggle(bot, caller, false),
    }
}

/// Stops overdue tournaments and reports each one.
#[instrument(skip(bot))]
pub async fn expire(bot: &JackpotBot, now: DateTime<Utc>) -> Vec<Reply> {
    let mut replies = Vec::new();
    for result in bot.stop_overdue(now) {
        replies.push(Reply::Expired {
            report: bot.report(&result).await,
        });
    }
    if !replies.is_empty() {
        debug!(count = replies.len(), "Expired tournaments");
    }
    replies
}

/// Parses one input line.
///
/// # Errors
///
/// Returns the JSON error for malformed lines.
pub fn parse_line(line: &str) -> Result<Inbound, serde_json::Error> {
    serde_json::from_str(line)
}

fn toggle(bot: &JackpotBot, caller: UserId, active: bool) -> Reply {
    match bot.set_active(caller, active) {
        Ok(bot_active) => Reply::Toggled { bot_active },
        Err(e) => refused(e),
    }
}

fn refused(error: impl std::fmt::Display) -> Reply {
    warn!(%error, "Command refused");
    Reply::Refused {
        error: error.to_string(),
    }
}
