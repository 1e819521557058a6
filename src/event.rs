//! Inbound chat traffic and the event records derived from it.
//!
//! [`ChatMessage`] mirrors what a chat transport hands over, with every
//! optional forward marker spelled out. [`ChatMessage::into_event`] decides
//! provenance and jackpot status once, so the classifier and store only ever
//! see plain booleans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::tournament::{ChatId, UserId};

/// Emoji the transport uses for the slot machine.
pub const SLOT_MACHINE_EMOJI: &str = "🎰";

/// Slot machine value for three sevens.
pub const JACKPOT_VALUE: u8 = 64;

/// One reel symbol of the slot machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SlotSymbol {
    /// BAR.
    Bar,
    /// Grapes.
    Grapes,
    /// Lemon.
    Lemon,
    /// Seven.
    Seven,
}

impl SlotSymbol {
    const REEL: [SlotSymbol; 4] = [Self::Bar, Self::Grapes, Self::Lemon, Self::Seven];

    /// Decodes the three reels from a slot machine value in `1..=64`.
    ///
    /// The value minus one packs one symbol per two bits, left reel lowest.
    #[instrument]
    pub fn reels(value: u8) -> Option<[SlotSymbol; 3]> {
        if !(1..=JACKPOT_VALUE).contains(&value) {
            return None;
        }
        let packed = usize::from(value - 1);
        Some([0, 1, 2].map(|reel| Self::REEL[(packed >> (2 * reel)) & 0b11]))
    }
}

/// An animated dice roll attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    /// Emoji the roll was sent with.
    pub emoji: String,
    /// Rolled value as reported by the transport.
    pub value: u8,
}

impl Dice {
    /// Returns true for the slot machine emoji.
    pub fn is_slot_machine(&self) -> bool {
        self.emoji == SLOT_MACHINE_EMOJI
    }

    /// Returns true for three sevens on the slot machine.
    pub fn is_jackpot(&self) -> bool {
        self.is_slot_machine() && self.value == JACKPOT_VALUE
    }

    /// Names the rolled combination, e.g. `seven-seven-seven`.
    pub fn outcome_kind(&self) -> String {
        match SlotSymbol::reels(self.value).filter(|_| self.is_slot_machine()) {
            Some(reels) => reels.map(|symbol| symbol.to_string()).join("-"),
            None => format!("{}:{}", self.emoji, self.value),
        }
    }
}

/// Which forward marker showed a message was not authored fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ForwardMarker {
    /// Forwarded from another user.
    FromUser,
    /// Forwarded from another chat.
    FromChat,
    /// Carries the id of the original message.
    OriginalMessageId,
    /// Forwarded from a user hiding their identity.
    HiddenSender,
    /// Carries the date of the original message.
    OriginalDate,
}

/// Forward provenance fields as the transport reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardInfo {
    /// Original sender.
    pub forward_from: Option<UserId>,
    /// Original chat.
    pub forward_from_chat: Option<ChatId>,
    /// Id of the original message.
    pub forward_from_message_id: Option<i64>,
    /// Display name of a sender hiding their account.
    pub forward_sender_name: Option<String>,
    /// Date of the original message.
    pub forward_date: Option<DateTime<Utc>>,
}

impl ForwardInfo {
    /// First marker present, checked in a fixed order.
    pub fn marker(&self) -> Option<ForwardMarker> {
        if self.forward_from.is_some() {
            Some(ForwardMarker::FromUser)
        } else if self.forward_from_chat.is_some() {
            Some(ForwardMarker::FromChat)
        } else if self.forward_from_message_id.is_some() {
            Some(ForwardMarker::OriginalMessageId)
        } else if self.forward_sender_name.as_deref().is_some_and(|name| !name.is_empty()) {
            Some(ForwardMarker::HiddenSender)
        } else if self.forward_date.is_some() {
            Some(ForwardMarker::OriginalDate)
        } else {
            None
        }
    }
}

/// A message as delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Chat the message was posted in.
    pub chat_id: ChatId,
    /// Chat title, absent for private chats.
    #[serde(default)]
    pub chat_title: Option<String>,
    /// Sender.
    pub user_id: UserId,
    /// Sender's display name.
    #[serde(default)]
    pub user_display_name: String,
    /// Dice roll, absent for ordinary messages.
    #[serde(default)]
    pub dice: Option<Dice>,
    /// Forward provenance.
    #[serde(default)]
    pub forward: ForwardInfo,
    /// When the transport says the message was sent.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Converts to a [`DiceEvent`], or `None` if the message has no roll.
    #[instrument(skip(self), fields(chat_id = self.chat_id, user_id = self.user_id))]
    pub fn into_event(self) -> Option<DiceEvent> {
        let Some(dice) = self.dice else {
            debug!("Message carries no dice roll");
            return None;
        };

        let marker = self.forward.marker();
        if let Some(marker) = marker {
            debug!(%marker, "Forward marker present");
        }

        Some(DiceEvent {
            chat_id: self.chat_id,
            user_id: self.user_id,
            user_display_name: self.user_display_name,
            outcome_kind: dice.outcome_kind(),
            outcome_is_jackpot: dice.is_jackpot(),
            is_forwarded: marker.is_some(),
            sent_at: self.date,
        })
    }
}

/// One roll, reduced to the fields the tournament core consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceEvent {
    /// Chat the roll was posted in.
    pub chat_id: ChatId,
    /// Player who rolled.
    pub user_id: UserId,
    /// Player's display name at the time of the roll.
    pub user_display_name: String,
    /// Rolled combination.
    pub outcome_kind: String,
    /// True if the roll hit the tracked jackpot.
    pub outcome_is_jackpot: bool,
    /// True if any forward marker was present.
    pub is_forwarded: bool,
    /// When the message was sent, if known.
    pub sent_at: Option<DateTime<Utc>>,
}
