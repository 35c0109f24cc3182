//! League facade over the store and the match recorder

use crate::clock::Clock;
use crate::config::LeagueSettings;
use crate::error::{LeagueError, Result};
use crate::recorder::MatchRecorder;
use crate::storage::RatingStore;
use crate::types::{Match, MatchSubmission, Player, PlayerId, PlayerSummary, RatingHistoryEntry};
use crate::utils::clean_name;
use std::sync::Arc;
use tracing::info;

/// Player registration, listings and match submission
pub struct LeagueService<S> {
    store: Arc<S>,
    recorder: MatchRecorder<S>,
    settings: LeagueSettings,
}

impl<S: RatingStore> LeagueService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, settings: LeagueSettings) -> Self {
        let recorder = MatchRecorder::new(store.clone(), clock)
            .with_default_match_name(settings.default_match_name.clone());

        Self {
            store,
            recorder,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a player at the initial rating
    pub fn register_player(&self, name: &str) -> Result<Player> {
        let name = clean_name(name).ok_or_else(|| LeagueError::InvalidPlayer {
            reason: "Player name is required".to_string(),
        })?;

        let player = self
            .store
            .create_player(&name, self.recorder.calculator().initial_rating())?;
        info!(player_id = player.id, "Registered player '{}'", player.name);
        Ok(player)
    }

    /// Players by rating, each with its most recent history
    pub fn list_players(&self) -> Result<Vec<PlayerSummary>> {
        self.store
            .list_players()?
            .into_iter()
            .map(|player| {
                let history = self
                    .store
                    .player_history(player.id, Some(self.settings.recent_history_limit))?;
                Ok(PlayerSummary { player, history })
            })
            .collect()
    }

    /// A player's full rating trail, newest first
    pub fn player_history(&self, player_id: PlayerId) -> Result<Vec<RatingHistoryEntry>> {
        if self.store.get_player(player_id)?.is_none() {
            return Err(LeagueError::UnknownPlayer {
                player_ids: vec![player_id],
            });
        }
        self.store.player_history(player_id, None)
    }

    /// All matches, newest first
    pub fn list_matches(&self) -> Result<Vec<Match>> {
        self.store.list_matches()
    }

    /// Record a completed match
    pub fn submit_match(&self, submission: &MatchSubmission) -> Result<Match> {
        self.recorder.submit_match(submission)
    }
}
