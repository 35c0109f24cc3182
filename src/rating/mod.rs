//! Team Elo rating system
//!
//! This module provides the pure rating math: expected scores, integer
//! rating updates, outcome classification and per-match rating plans.

pub mod calculator;
pub mod elo;

// Re-export commonly used types
pub use calculator::{MatchRatingPlan, PlayerRatingChange, RatingCalculator, TeamEloCalculator};
pub use elo::{
    expected_score, team_mean, updated_rating, MatchOutcome, Outcome, DEFAULT_RATING, K_FACTOR,
};
