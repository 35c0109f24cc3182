//! Test fixtures and store wrappers for integration testing

use std::collections::{BTreeSet, HashMap};
use team_elo::error::{LeagueError, Result};
use team_elo::storage::{
    InMemoryRatingStore, NewHistoryEntry, NewMatch, PlayerUpdate, RatingStore, StoreTransaction,
};
use team_elo::types::{
    HistoryId, Match, MatchId, MatchSubmission, Player, PlayerId, RatingHistoryEntry,
};

/// In-memory store whose transactions fail on the Nth write (1-based)
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryRatingStore,
    fail_on_write: Option<usize>,
}

impl FlakyStore {
    pub fn new(fail_on_write: Option<usize>) -> Self {
        Self {
            inner: InMemoryRatingStore::new(),
            fail_on_write,
        }
    }

    pub fn set_fail_on_write(&mut self, fail_on_write: Option<usize>) {
        self.fail_on_write = fail_on_write;
    }
}

struct FlakyTransaction<'a> {
    inner: &'a mut dyn StoreTransaction,
    writes: usize,
    fail_on_write: Option<usize>,
}

impl FlakyTransaction<'_> {
    fn count_write(&mut self) -> Result<()> {
        self.writes += 1;
        if Some(self.writes) == self.fail_on_write {
            return Err(LeagueError::persistence(format!(
                "Injected failure on write {}",
                self.writes
            )));
        }
        Ok(())
    }
}

impl StoreTransaction for FlakyTransaction<'_> {
    fn fetch_players(&mut self, ids: &BTreeSet<PlayerId>) -> Result<HashMap<PlayerId, Player>> {
        self.inner.fetch_players(ids)
    }

    fn create_match(&mut self, record: &NewMatch) -> Result<MatchId> {
        let id = self.inner.create_match(record)?;
        self.count_write()?;
        Ok(id)
    }

    fn update_player(&mut self, update: &PlayerUpdate) -> Result<()> {
        self.inner.update_player(update)?;
        self.count_write()
    }

    fn append_history_entry(&mut self, entry: &NewHistoryEntry) -> Result<HistoryId> {
        let id = self.inner.append_history_entry(entry)?;
        self.count_write()?;
        Ok(id)
    }
}

impl RatingStore for FlakyStore {
    fn run_atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T>,
    {
        let fail_on_write = self.fail_on_write;
        self.inner.run_atomically(|tx| {
            work(&mut FlakyTransaction {
                inner: tx,
                writes: 0,
                fail_on_write,
            })
        })
    }

    fn create_player(&self, name: &str, rating: i64) -> Result<Player> {
        self.inner.create_player(name, rating)
    }

    fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        self.inner.get_player(player_id)
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        self.inner.list_players()
    }

    fn player_history(
        &self,
        player_id: PlayerId,
        limit: Option<usize>,
    ) -> Result<Vec<RatingHistoryEntry>> {
        self.inner.player_history(player_id, limit)
    }

    fn match_history(&self, match_id: MatchId) -> Result<Vec<RatingHistoryEntry>> {
        self.inner.match_history(match_id)
    }

    fn list_matches(&self) -> Result<Vec<Match>> {
        self.inner.list_matches()
    }
}

/// Register players at the given ratings, returning their ids in order
pub fn seed_players<S: RatingStore>(store: &S, ratings: &[i64]) -> Vec<PlayerId> {
    ratings
        .iter()
        .enumerate()
        .map(|(i, rating)| {
            store
                .create_player(&format!("player{}", i + 1), *rating)
                .unwrap()
                .id
        })
        .collect()
}

/// Build a match submission without a name
pub fn create_submission(
    team1: &[PlayerId],
    team2: &[PlayerId],
    team1_score: u32,
    team2_score: u32,
) -> MatchSubmission {
    MatchSubmission {
        team1_players: team1.to_vec(),
        team2_players: team2.to_vec(),
        team1_score,
        team2_score,
        name: None,
    }
}
