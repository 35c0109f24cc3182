//! Match submission
//!
//! One submission is one unit of work against the store: read the rosters,
//! plan the rating changes, then write the match, the player rows and the
//! history entries. Validation that needs no storage happens before the unit
//! starts.

use crate::clock::Clock;
use crate::error::{LeagueError, Result};
use crate::rating::calculator::{MatchRatingPlan, RatingCalculator, TeamEloCalculator};
use crate::rating::elo::MatchOutcome;
use crate::storage::store::{
    ensure_complete, NewHistoryEntry, NewMatch, PlayerUpdate, RatingStore, StoreTransaction,
};
use crate::types::{Match, MatchId, MatchSubmission, Player, PlayerId, Team};
use crate::utils::match_name_or;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Name used when a submission carries none
pub const DEFAULT_MATCH_NAME: &str = "Training match";

/// Records completed matches and keeps ratings consistent with history
pub struct MatchRecorder<S> {
    store: Arc<S>,
    calculator: Arc<dyn RatingCalculator>,
    clock: Arc<dyn Clock>,
    default_match_name: String,
}

impl<S: RatingStore> MatchRecorder<S> {
    /// Create a recorder using the team Elo calculator
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            calculator: Arc::new(TeamEloCalculator::new()),
            clock,
            default_match_name: DEFAULT_MATCH_NAME.to_string(),
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn RatingCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_default_match_name(mut self, name: impl Into<String>) -> Self {
        self.default_match_name = name.into();
        self
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Record a match, timestamped by the injected clock
    pub fn submit_match(&self, submission: &MatchSubmission) -> Result<Match> {
        let timestamp = self.clock.now();
        self.submit_match_at(submission, timestamp)
    }

    /// Record a match with an explicit timestamp
    pub fn submit_match_at(
        &self,
        submission: &MatchSubmission,
        timestamp: DateTime<Utc>,
    ) -> Result<Match> {
        let result = validate_rosters(submission).and_then(|()| {
            self.store
                .run_atomically(|tx| self.record_in(tx, submission, timestamp))
        });

        match &result {
            Ok(recorded) => info!(
                match_id = recorded.id,
                team1_score = recorded.team1_score,
                team2_score = recorded.team2_score,
                team1_elo_change = recorded.team1_elo_change,
                team2_elo_change = recorded.team2_elo_change,
                "Recorded match '{}'",
                recorded.name
            ),
            Err(e) if e.is_caller_error() => warn!(
                team1 = ?submission.team1_players,
                team2 = ?submission.team2_players,
                "Match submission rejected: {}",
                e
            ),
            Err(e) => error!(
                team1 = ?submission.team1_players,
                team2 = ?submission.team2_players,
                "Match submission failed: {}",
                e
            ),
        }

        result
    }

    fn record_in(
        &self,
        tx: &mut dyn StoreTransaction,
        submission: &MatchSubmission,
        timestamp: DateTime<Utc>,
    ) -> Result<Match> {
        let ids: BTreeSet<PlayerId> = submission
            .team1_players
            .iter()
            .chain(submission.team2_players.iter())
            .copied()
            .collect();

        let players = tx.fetch_players(&ids)?;
        ensure_complete(&ids, &players)?;

        let team1 = roster_players(&submission.team1_players, &players);
        let team2 = roster_players(&submission.team2_players, &players);

        let outcome = MatchOutcome::from_scores(submission.team1_score, submission.team2_score);
        let plan = self.calculator.plan(&team1, &team2, outcome)?;

        let record = NewMatch {
            date: timestamp,
            name: match_name_or(submission.name.as_deref(), &self.default_match_name),
            team1_players: submission.team1_players.clone(),
            team2_players: submission.team2_players.clone(),
            team1_score: submission.team1_score,
            team2_score: submission.team2_score,
            team1_elo_change: plan.average_delta(Team::One),
            team2_elo_change: plan.average_delta(Team::Two),
        };

        let match_id = tx.create_match(&record)?;
        apply_plan(tx, &plan, &players, match_id, timestamp)?;

        Ok(record.into_match(match_id))
    }
}

/// Reject empty rosters and any player listed more than once across both
pub fn validate_rosters(submission: &MatchSubmission) -> Result<()> {
    if submission.team1_players.is_empty() {
        return Err(LeagueError::EmptyRoster { team: Team::One });
    }
    if submission.team2_players.is_empty() {
        return Err(LeagueError::EmptyRoster { team: Team::Two });
    }

    let mut seen = HashSet::new();
    for player_id in submission
        .team1_players
        .iter()
        .chain(submission.team2_players.iter())
    {
        if !seen.insert(*player_id) {
            return Err(LeagueError::DuplicatePlayer {
                player_id: *player_id,
            });
        }
    }

    Ok(())
}

fn roster_players(roster: &[PlayerId], players: &HashMap<PlayerId, Player>) -> Vec<Player> {
    roster
        .iter()
        .filter_map(|id| players.get(id).cloned())
        .collect()
}

fn apply_plan(
    tx: &mut dyn StoreTransaction,
    plan: &MatchRatingPlan,
    players: &HashMap<PlayerId, Player>,
    match_id: MatchId,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    for change in &plan.changes {
        let player = players
            .get(&change.player_id)
            .ok_or_else(|| LeagueError::UnknownPlayer {
                player_ids: vec![change.player_id],
            })?;

        tx.update_player(&PlayerUpdate::after_match(player, change))?;
        tx.append_history_entry(&NewHistoryEntry {
            player_id: change.player_id,
            match_id,
            old_elo: change.old_rating,
            new_elo: change.new_rating,
            date: timestamp,
        })?;
    }
    Ok(())
}
