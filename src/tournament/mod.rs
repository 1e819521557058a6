//! Per-chat tournament lifecycle and tallying.

mod error;
mod store;
mod types;

pub use error::TournamentError;
pub use store::{StoreSnapshot, TournamentStore};
pub use types::{ChatId, PlayerTally, Ranking, Tournament, TournamentResult, TournamentStatus, UserId};
