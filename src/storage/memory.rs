//! In-memory rating store
//!
//! Transactions hold the write lock for their whole duration. Writes go to a
//! staged set of touched player rows, new matches and new history entries,
//! which is merged into the live tables only on success.

use crate::error::{LeagueError, Result};
use crate::storage::store::{
    ensure_complete, NewHistoryEntry, NewMatch, PlayerUpdate, RatingStore, StoreTransaction,
};
use crate::types::{HistoryId, Match, MatchId, Player, PlayerId, RatingHistoryEntry};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct LeagueTables {
    players: BTreeMap<PlayerId, Player>,
    matches: BTreeMap<MatchId, Match>,
    history: Vec<RatingHistoryEntry>,
    last_player_id: PlayerId,
    last_match_id: MatchId,
    last_history_id: HistoryId,
}

impl LeagueTables {
    fn commit(&mut self, staged: StagedWrites) {
        self.players.extend(staged.players);
        self.matches.extend(staged.matches.into_iter().map(|m| (m.id, m)));
        self.history.extend(staged.history);
        self.last_match_id = staged.last_match_id;
        self.last_history_id = staged.last_history_id;
    }
}

/// Rows written by one unit of work, not yet visible to readers
#[derive(Debug)]
struct StagedWrites {
    players: HashMap<PlayerId, Player>,
    matches: Vec<Match>,
    history: Vec<RatingHistoryEntry>,
    last_match_id: MatchId,
    last_history_id: HistoryId,
}

impl StagedWrites {
    fn on_top_of(tables: &LeagueTables) -> Self {
        Self {
            players: HashMap::new(),
            matches: Vec::new(),
            history: Vec::new(),
            last_match_id: tables.last_match_id,
            last_history_id: tables.last_history_id,
        }
    }
}

/// In-memory implementation of [`RatingStore`]
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    tables: RwLock<LeagueTables>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LeagueTables>> {
        self.tables
            .read()
            .map_err(|_| LeagueError::persistence("Failed to acquire tables read lock"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LeagueTables>> {
        self.tables
            .write()
            .map_err(|_| LeagueError::persistence("Failed to acquire tables write lock"))
    }
}

struct MemoryTransaction<'a> {
    tables: &'a LeagueTables,
    staged: StagedWrites,
}

impl MemoryTransaction<'_> {
    fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.staged
            .players
            .get(&player_id)
            .or_else(|| self.tables.players.get(&player_id))
    }

    fn match_exists(&self, match_id: MatchId) -> bool {
        self.tables.matches.contains_key(&match_id)
            || self.staged.matches.iter().any(|m| m.id == match_id)
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn fetch_players(&mut self, ids: &BTreeSet<PlayerId>) -> Result<HashMap<PlayerId, Player>> {
        let found: HashMap<PlayerId, Player> = ids
            .iter()
            .filter_map(|id| self.player(*id).map(|p| (*id, p.clone())))
            .collect();

        ensure_complete(ids, &found)?;
        Ok(found)
    }

    fn create_match(&mut self, record: &NewMatch) -> Result<MatchId> {
        self.staged.last_match_id += 1;
        let id = self.staged.last_match_id;
        self.staged.matches.push(record.clone().into_match(id));
        Ok(id)
    }

    fn update_player(&mut self, update: &PlayerUpdate) -> Result<()> {
        let mut player = self
            .player(update.player_id)
            .cloned()
            .ok_or_else(|| LeagueError::UnknownPlayer {
                player_ids: vec![update.player_id],
            })?;

        update.apply_to(&mut player);
        self.staged.players.insert(player.id, player);
        Ok(())
    }

    fn append_history_entry(&mut self, entry: &NewHistoryEntry) -> Result<HistoryId> {
        if self.player(entry.player_id).is_none() {
            return Err(LeagueError::persistence(format!(
                "History entry references missing player {}",
                entry.player_id
            )));
        }
        if !self.match_exists(entry.match_id) {
            return Err(LeagueError::persistence(format!(
                "History entry references missing match {}",
                entry.match_id
            )));
        }

        self.staged.last_history_id += 1;
        let id = self.staged.last_history_id;
        self.staged.history.push(entry.clone().into_entry(id));
        Ok(id)
    }
}

impl RatingStore for InMemoryRatingStore {
    fn run_atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T>,
    {
        let mut tables = self.write()?;
        let mut tx = MemoryTransaction {
            tables: &tables,
            staged: StagedWrites::on_top_of(&tables),
        };

        let value = work(&mut tx)?;

        let staged = tx.staged;
        tables.commit(staged);
        Ok(value)
    }

    fn create_player(&self, name: &str, rating: i64) -> Result<Player> {
        let mut tables = self.write()?;
        tables.last_player_id += 1;

        let player = Player {
            id: tables.last_player_id,
            name: name.to_string(),
            rating,
            matches: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        };
        tables.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        Ok(self.read()?.players.get(&player_id).cloned())
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        let mut players: Vec<Player> = self.read()?.players.values().cloned().collect();
        players.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));
        Ok(players)
    }

    fn player_history(
        &self,
        player_id: PlayerId,
        limit: Option<usize>,
    ) -> Result<Vec<RatingHistoryEntry>> {
        let mut entries: Vec<RatingHistoryEntry> = self
            .read()?
            .history
            .iter()
            .filter(|entry| entry.player_id == player_id)
            .cloned()
            .collect();

        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    fn match_history(&self, match_id: MatchId) -> Result<Vec<RatingHistoryEntry>> {
        Ok(self
            .read()?
            .history
            .iter()
            .filter(|entry| entry.match_id == match_id)
            .cloned()
            .collect())
    }

    fn list_matches(&self) -> Result<Vec<Match>> {
        let mut matches: Vec<Match> = self.read()?.matches.values().cloned().collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(matches)
    }
}
