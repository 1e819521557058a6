//! Tournament store error types.

use derive_more::{Display, Error};

use crate::tournament::ChatId;

/// A store operation that does not match a valid lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum TournamentError {
    /// `start` was called while the chat already has an active tournament.
    #[display("Chat {chat_id} already has an active tournament")]
    AlreadyActive {
        /// Chat that was asked to start.
        chat_id: ChatId,
    },

    /// `stop` was called for a chat with no tracked tournament.
    #[display("Chat {chat_id} has no tournament")]
    NotFound {
        /// Chat that was asked to stop.
        chat_id: ChatId,
    },
}
