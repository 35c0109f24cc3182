//! Persistence contract for players, matches and rating history
//!
//! All writes caused by a match go through [`RatingStore::run_atomically`]:
//! the unit of work either commits as a whole or leaves no trace.

use crate::error::{LeagueError, Result};
use crate::rating::calculator::PlayerRatingChange;
use crate::rating::elo::Outcome;
use crate::types::{HistoryId, Match, MatchId, Player, PlayerId, RatingHistoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Match row to insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub date: DateTime<Utc>,
    pub name: String,
    pub team1_players: Vec<PlayerId>,
    pub team2_players: Vec<PlayerId>,
    pub team1_score: u32,
    pub team2_score: u32,
    pub team1_elo_change: f64,
    pub team2_elo_change: f64,
}

impl NewMatch {
    /// Full match view once the store has assigned an id
    pub fn into_match(self, id: MatchId) -> Match {
        Match {
            id,
            date: self.date,
            name: self.name,
            team1_players: self.team1_players,
            team2_players: self.team2_players,
            team1_score: self.team1_score,
            team2_score: self.team2_score,
            team1_elo_change: self.team1_elo_change,
            team2_elo_change: self.team2_elo_change,
        }
    }
}

/// New rating and counters for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub player_id: PlayerId,
    pub rating: i64,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl PlayerUpdate {
    /// Counters and rating of `player` after applying `change`
    pub fn after_match(player: &Player, change: &PlayerRatingChange) -> Self {
        let mut update = Self {
            player_id: player.id,
            rating: change.new_rating,
            matches: player.matches + 1,
            wins: player.wins,
            losses: player.losses,
            draws: player.draws,
        };
        match change.outcome {
            Outcome::Win => update.wins += 1,
            Outcome::Loss => update.losses += 1,
            Outcome::Draw => update.draws += 1,
        }
        update
    }

    /// Apply this update to an in-memory player record
    pub fn apply_to(&self, player: &mut Player) {
        player.rating = self.rating;
        player.matches = self.matches;
        player.wins = self.wins;
        player.losses = self.losses;
        player.draws = self.draws;
    }
}

/// History row to append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub player_id: PlayerId,
    pub match_id: MatchId,
    pub old_elo: i64,
    pub new_elo: i64,
    pub date: DateTime<Utc>,
}

impl NewHistoryEntry {
    pub fn into_entry(self, id: HistoryId) -> RatingHistoryEntry {
        RatingHistoryEntry {
            id,
            player_id: self.player_id,
            match_id: self.match_id,
            old_elo: self.old_elo,
            new_elo: self.new_elo,
            date: self.date,
        }
    }
}

/// Operations available inside one atomic unit of work
pub trait StoreTransaction {
    /// Fetch exactly the requested players, or `UnknownPlayer` naming the missing ones
    fn fetch_players(&mut self, ids: &BTreeSet<PlayerId>) -> Result<HashMap<PlayerId, Player>>;

    /// Insert a match row and return its id
    fn create_match(&mut self, record: &NewMatch) -> Result<MatchId>;

    /// Overwrite a player's rating and counters
    fn update_player(&mut self, update: &PlayerUpdate) -> Result<()>;

    /// Append one rating history entry
    fn append_history_entry(&mut self, entry: &NewHistoryEntry) -> Result<HistoryId>;
}

/// Trait for rating storage backends
pub trait RatingStore: Send + Sync {
    /// Run `work` as one all-or-nothing transaction.
    ///
    /// If `work` returns an error, or the commit fails, nothing it wrote is
    /// visible to later reads.
    fn run_atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T>;

    /// Insert a new player with zeroed counters
    fn create_player(&self, name: &str, rating: i64) -> Result<Player>;

    /// Get a single player
    fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>>;

    /// All players, highest rating first (ties by id)
    fn list_players(&self) -> Result<Vec<Player>>;

    /// A player's history, newest first, optionally truncated
    fn player_history(
        &self,
        player_id: PlayerId,
        limit: Option<usize>,
    ) -> Result<Vec<RatingHistoryEntry>>;

    /// All history entries written for one match
    fn match_history(&self, match_id: MatchId) -> Result<Vec<RatingHistoryEntry>>;

    /// All matches, newest first (ties by id, newest first)
    fn list_matches(&self) -> Result<Vec<Match>>;
}

/// Fail with `UnknownPlayer` unless every requested id was found
pub fn ensure_complete(
    requested: &BTreeSet<PlayerId>,
    found: &HashMap<PlayerId, Player>,
) -> Result<()> {
    let missing: Vec<PlayerId> = requested
        .iter()
        .filter(|id| !found.contains_key(*id))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LeagueError::UnknownPlayer {
            player_ids: missing,
        })
    }
}
