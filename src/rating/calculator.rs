//! Rating calculator trait and the team Elo implementation
//!
//! A calculator turns two pre-match rosters and a classified outcome into an
//! immutable [`MatchRatingPlan`]. Nothing here touches storage; the plan is
//! later applied by the match recorder in a single transaction.

use crate::error::{LeagueError, Result};
use crate::rating::elo::{self, MatchOutcome, Outcome, DEFAULT_RATING};
use crate::types::{Player, PlayerId, Team};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Planned rating change for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRatingChange {
    pub player_id: PlayerId,
    pub team: Team,
    pub old_rating: i64,
    pub new_rating: i64,
    pub outcome: Outcome,
}

impl PlayerRatingChange {
    pub fn delta(&self) -> i64 {
        self.new_rating - self.old_rating
    }
}

/// Shared expectation for one side of the match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamExpectation {
    /// Mean pre-match rating of the roster, unrounded
    pub mean_rating: f64,
    pub expected: f64,
    pub actual: f64,
}

/// Every rating change a match produces, computed up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRatingPlan {
    pub outcome: MatchOutcome,
    pub team1: TeamExpectation,
    pub team2: TeamExpectation,
    /// Team 1 changes in roster order, followed by team 2
    pub changes: Vec<PlayerRatingChange>,
}

impl MatchRatingPlan {
    /// Changes for one side, in roster order
    pub fn team_changes(&self, team: Team) -> impl Iterator<Item = &PlayerRatingChange> {
        self.changes.iter().filter(move |change| change.team == team)
    }

    /// Mean delta across one side's roster
    pub fn average_delta(&self, team: Team) -> f64 {
        let deltas: Vec<i64> = self.team_changes(team).map(|c| c.delta()).collect();
        if deltas.is_empty() {
            return 0.0;
        }
        deltas.iter().sum::<i64>() as f64 / deltas.len() as f64
    }
}

/// Trait for computing rating changes after a two-team match
pub trait RatingCalculator: Send + Sync {
    /// Plan the rating changes for both rosters.
    ///
    /// # Arguments
    /// * `team1` - Team 1 players with their pre-match ratings
    /// * `team2` - Team 2 players with their pre-match ratings
    /// * `outcome` - Classified result of the match
    fn plan(
        &self,
        team1: &[Player],
        team2: &[Player],
        outcome: MatchOutcome,
    ) -> Result<MatchRatingPlan>;

    /// Rating given to new players
    fn initial_rating(&self) -> i64;
}

/// Team Elo: expectation from the roster means, update from each player's own rating
#[derive(Debug, Clone, Default)]
pub struct TeamEloCalculator;

impl TeamEloCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl RatingCalculator for TeamEloCalculator {
    fn plan(
        &self,
        team1: &[Player],
        team2: &[Player],
        outcome: MatchOutcome,
    ) -> Result<MatchRatingPlan> {
        if team1.is_empty() {
            return Err(LeagueError::EmptyRoster { team: Team::One });
        }
        if team2.is_empty() {
            return Err(LeagueError::EmptyRoster { team: Team::Two });
        }

        let team1_mean = elo::team_mean(&team1.iter().map(|p| p.rating).collect::<Vec<_>>());
        let team2_mean = elo::team_mean(&team2.iter().map(|p| p.rating).collect::<Vec<_>>());

        // Complement of team 1, never recomputed
        let expected1 = elo::expected_score(team1_mean, team2_mean);
        let expected2 = 1.0 - expected1;

        let (outcome1, outcome2) = outcome.outcomes();
        let team1_expectation = TeamExpectation {
            mean_rating: team1_mean,
            expected: expected1,
            actual: outcome1.actual_score(),
        };
        let team2_expectation = TeamExpectation {
            mean_rating: team2_mean,
            expected: expected2,
            actual: outcome2.actual_score(),
        };

        let changes = team1
            .iter()
            .map(|player| (player, Team::One, &team1_expectation, outcome1))
            .chain(
                team2
                    .iter()
                    .map(|player| (player, Team::Two, &team2_expectation, outcome2)),
            )
            .map(|(player, team, expectation, outcome)| PlayerRatingChange {
                player_id: player.id,
                team,
                old_rating: player.rating,
                new_rating: elo::updated_rating(
                    player.rating,
                    expectation.expected,
                    expectation.actual,
                ),
                outcome,
            })
            .collect::<Vec<_>>();

        debug!(
            team1_mean,
            team2_mean,
            expected1,
            ?outcome,
            participants = changes.len(),
            "Planned rating changes"
        );

        Ok(MatchRatingPlan {
            outcome,
            team1: team1_expectation,
            team2: team2_expectation,
            changes,
        })
    }

    fn initial_rating(&self) -> i64 {
        DEFAULT_RATING
    }
}
