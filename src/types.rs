//! Common types used throughout the rating service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for players
pub type PlayerId = i64;

/// Unique identifier for matches
pub type MatchId = i64;

/// Unique identifier for rating history entries
pub type HistoryId = i64;

/// Which side of a match a roster belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::One => write!(f, "team1"),
            Team::Two => write!(f, "team2"),
        }
    }
}

/// A rated player with cumulative results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(rename = "elo")]
    pub rating: i64,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// A recorded match. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub date: DateTime<Utc>,
    pub name: String,
    pub team1_players: Vec<PlayerId>,
    pub team2_players: Vec<PlayerId>,
    pub team1_score: u32,
    pub team2_score: u32,
    /// Average rating delta across team 1's roster
    pub team1_elo_change: f64,
    /// Average rating delta across team 2's roster
    pub team2_elo_change: f64,
}

/// One player's rating change from one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingHistoryEntry {
    pub id: HistoryId,
    pub player_id: PlayerId,
    pub match_id: MatchId,
    pub old_elo: i64,
    pub new_elo: i64,
    pub date: DateTime<Utc>,
}

/// Player listing view: the player plus its newest history entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    #[serde(flatten)]
    pub player: Player,
    pub history: Vec<RatingHistoryEntry>,
}

/// Request to record a completed match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSubmission {
    #[serde(default)]
    pub team1_players: Vec<PlayerId>,
    #[serde(default)]
    pub team2_players: Vec<PlayerId>,
    #[serde(default)]
    pub team1_score: u32,
    #[serde(default)]
    pub team2_score: u32,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request to register a new player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayerRequest {
    #[serde(default)]
    pub name: String,
}
