//! Team Elo - ratings and match history for team-based pickup games
//!
//! This crate provides the team Elo rating math, a transactional match
//! recorder, SQLite and in-memory stores, and a small HTTP API.

pub mod clock;
pub mod config;
pub mod error;
pub mod rating;
pub mod recorder;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LeagueError, Result};
pub use types::*;

// Re-export key components
pub use clock::{Clock, FixedClock, SystemClock};
pub use recorder::MatchRecorder;
pub use storage::{InMemoryRatingStore, RatingStore, SqliteRatingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
