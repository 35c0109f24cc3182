//! Error types for the rating service
//!
//! Every failure of a submission is terminal for that submission. Nothing is
//! retried internally and no partial state is ever committed.

use crate::types::{PlayerId, Team};

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LeagueError>;

/// Errors surfaced by the rating core and its stores
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeagueError {
    #[error("{team} roster is empty")]
    EmptyRoster { team: Team },

    #[error("Unknown player(s): {player_ids:?}")]
    UnknownPlayer { player_ids: Vec<PlayerId> },

    #[error("Player {player_id} appears more than once in the match")]
    DuplicatePlayer { player_id: PlayerId },

    #[error("Invalid player: {reason}")]
    InvalidPlayer { reason: String },

    #[error("Persistence failure: {message}")]
    PersistenceFailure { message: String },
}

impl LeagueError {
    /// Shorthand for a store-side failure
    pub fn persistence(message: impl Into<String>) -> Self {
        LeagueError::PersistenceFailure {
            message: message.into(),
        }
    }

    /// True for errors the caller can fix by changing the request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            LeagueError::EmptyRoster { .. }
                | LeagueError::UnknownPlayer { .. }
                | LeagueError::DuplicatePlayer { .. }
                | LeagueError::InvalidPlayer { .. }
        )
    }
}

impl From<rusqlite::Error> for LeagueError {
    fn from(err: rusqlite::Error) -> Self {
        LeagueError::persistence(err.to_string())
    }
}

impl From<serde_json::Error> for LeagueError {
    fn from(err: serde_json::Error) -> Self {
        LeagueError::persistence(format!("Roster encoding failed: {}", err))
    }
}
