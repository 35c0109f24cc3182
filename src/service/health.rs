//! Health check for the rating service

use crate::service::league::LeagueService;
use crate::storage::RatingStore;
use serde::{Deserialize, Serialize};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Number of registered players, when the store answered
    pub players: Option<usize>,
    /// Number of recorded matches, when the store answered
    pub matches: Option<usize>,
    /// Store error, if any
    pub message: Option<String>,
}

impl HealthCheck {
    /// Probe the store through the league service
    pub fn check<S: RatingStore>(service_name: &str, league: &LeagueService<S>) -> Self {
        let counts = league
            .store()
            .list_players()
            .and_then(|players| Ok((players.len(), league.store().list_matches()?.len())));

        let (status, players, matches, message) = match counts {
            Ok((players, matches)) => (HealthStatus::Healthy, Some(players), Some(matches), None),
            Err(e) => (HealthStatus::Unhealthy, None, None, Some(e.to_string())),
        };

        Self {
            status,
            service: service_name.to_string(),
            version: crate::VERSION.to_string(),
            timestamp: crate::utils::current_timestamp(),
            players,
            matches,
            message,
        }
    }
}
