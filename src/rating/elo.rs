//! Elo primitives for two-team matches
//!
//! Expected scores come from the skillratings Elo model; the rating update
//! itself is integer-valued and uses a fixed K-factor.

use serde::{Deserialize, Serialize};
use skillratings::elo::EloRating;

/// Maximum rating swing per match
pub const K_FACTOR: f64 = 32.0;

/// Rating assigned to newly registered players
pub const DEFAULT_RATING: i64 = 1200;

/// Result of a match from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Actual score: 1 for a win, 0.5 for a draw, 0 for a loss
    pub fn actual_score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

/// Classified result of a match between team 1 and team 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    Team1Win,
    Team2Win,
    Draw,
}

impl MatchOutcome {
    /// Classify a match from the final scores
    pub fn from_scores(team1_score: u32, team2_score: u32) -> Self {
        match team1_score.cmp(&team2_score) {
            std::cmp::Ordering::Greater => MatchOutcome::Team1Win,
            std::cmp::Ordering::Less => MatchOutcome::Team2Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
        }
    }

    /// Per-team outcomes as (team1, team2)
    pub fn outcomes(self) -> (Outcome, Outcome) {
        match self {
            MatchOutcome::Team1Win => (Outcome::Win, Outcome::Loss),
            MatchOutcome::Team2Win => (Outcome::Loss, Outcome::Win),
            MatchOutcome::Draw => (Outcome::Draw, Outcome::Draw),
        }
    }

    /// Actual scores as (team1, team2)
    pub fn actual_scores(self) -> (f64, f64) {
        let (one, two) = self.outcomes();
        (one.actual_score(), two.actual_score())
    }
}

/// Probability-like expectation that side A beats side B
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    let (expected_a, _) = skillratings::elo::expected_score(
        &EloRating { rating: rating_a },
        &EloRating { rating: rating_b },
    );
    expected_a
}

/// New integer rating after a match.
///
/// Half-point results round to the nearest even integer. Ratings are not
/// clamped and may go negative.
pub fn updated_rating(current_rating: i64, expected: f64, actual: f64) -> i64 {
    let raw = current_rating as f64 + K_FACTOR * (actual - expected);
    raw.round_ties_even() as i64
}

/// Arithmetic mean of a roster's ratings, 0.0 for an empty slice
pub fn team_mean(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_ratings_expect_half() {
        assert_eq!(expected_score(1200.0, 1200.0), 0.5);
        assert_eq!(expected_score(-350.0, -350.0), 0.5);
    }

    #[test]
    fn test_expected_score_known_gap() {
        let expected = expected_score(1200.0, 1300.0);
        assert!((expected - 0.359935).abs() < 1e-6);
    }

    #[test]
    fn test_updated_rating_even_match() {
        assert_eq!(updated_rating(1200, 0.5, 1.0), 1216);
        assert_eq!(updated_rating(1200, 0.5, 0.0), 1184);
        assert_eq!(updated_rating(1200, 0.5, 0.5), 1200);
    }

    #[test]
    fn test_updated_rating_rounds_half_to_even() {
        // 32 * (0.5 - 0.484375) is exactly 0.5
        assert_eq!(updated_rating(1200, 0.484375, 0.5), 1200);
        assert_eq!(updated_rating(1201, 0.484375, 0.5), 1202);
        assert_eq!(updated_rating(1200, 0.515625, 0.5), 1200);
        assert_eq!(updated_rating(1201, 0.515625, 0.5), 1200);
    }

    #[test]
    fn test_updated_rating_is_unclamped() {
        assert_eq!(updated_rating(5, 1.0, 0.0), -27);
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(MatchOutcome::from_scores(3, 1), MatchOutcome::Team1Win);
        assert_eq!(MatchOutcome::from_scores(1, 2), MatchOutcome::Team2Win);
        assert_eq!(MatchOutcome::from_scores(2, 2), MatchOutcome::Draw);
        assert_eq!(MatchOutcome::from_scores(0, 0), MatchOutcome::Draw);

        assert_eq!(MatchOutcome::Team1Win.actual_scores(), (1.0, 0.0));
        assert_eq!(MatchOutcome::Team2Win.actual_scores(), (0.0, 1.0));
        assert_eq!(MatchOutcome::Draw.actual_scores(), (0.5, 0.5));
    }

    #[test]
    fn test_team_mean() {
        assert_eq!(team_mean(&[1200, 1400]), 1300.0);
        assert_eq!(team_mean(&[1200, 1201]), 1200.5);
        assert_eq!(team_mean(&[]), 0.0);
    }

    proptest! {
        #[test]
        fn prop_expected_scores_are_complementary(
            a in -4000.0f64..4000.0,
            b in -4000.0f64..4000.0,
        ) {
            let sum = expected_score(a, b) + expected_score(b, a);
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_expected_score_in_open_interval(a in -1000.0f64..3000.0, b in -1000.0f64..3000.0) {
            let expected = expected_score(a, b);
            prop_assert!(expected > 0.0 && expected < 1.0);
        }

        #[test]
        fn prop_expected_score_monotonic(
            a in 0.0f64..3000.0,
            gap in 1.0f64..500.0,
            b in 0.0f64..3000.0,
        ) {
            prop_assert!(expected_score(a + gap, b) > expected_score(a, b));
        }
    }
}
