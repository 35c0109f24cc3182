//! SQLite rating store
//!
//! Rosters are stored as JSON arrays of player ids. Units of work run inside
//! an `IMMEDIATE` transaction so concurrent submissions serialize on the
//! database write lock.

use crate::error::{LeagueError, Result};
use crate::storage::store::{
    ensure_complete, NewHistoryEntry, NewMatch, PlayerUpdate, RatingStore, StoreTransaction,
};
use crate::types::{HistoryId, Match, MatchId, Player, PlayerId, RatingHistoryEntry};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    elo INTEGER NOT NULL,
    matches INTEGER NOT NULL,
    wins INTEGER NOT NULL,
    losses INTEGER NOT NULL,
    draws INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    name TEXT NOT NULL,
    team1_players TEXT NOT NULL,
    team2_players TEXT NOT NULL,
    team1_score INTEGER NOT NULL,
    team2_score INTEGER NOT NULL,
    team1_elo_change REAL NOT NULL,
    team2_elo_change REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS player_history (
    id INTEGER PRIMARY KEY,
    player_id INTEGER NOT NULL REFERENCES players (id),
    match_id INTEGER NOT NULL REFERENCES matches (id),
    old_elo INTEGER NOT NULL,
    new_elo INTEGER NOT NULL,
    date TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_player_history_player ON player_history (player_id);
";

const PLAYER_COLUMNS: &str = "id, name, elo, matches, wins, losses, draws";
const MATCH_COLUMNS: &str = "id, date, name, team1_players, team2_players, team1_score, \
                             team2_score, team1_elo_change, team2_elo_change";
const HISTORY_COLUMNS: &str = "id, player_id, match_id, old_elo, new_elo, date";

/// SQLite implementation of [`RatingStore`]
pub struct SqliteRatingStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteRatingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRatingStore").finish_non_exhaustive()
    }
}

impl SqliteRatingStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened SQLite rating store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LeagueError::persistence("Failed to acquire database lock"))
    }
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        rating: row.get(2)?,
        matches: row.get(3)?,
        wins: row.get(4)?,
        losses: row.get(5)?,
        draws: row.get(6)?,
    })
}

fn parse_history_row(row: &rusqlite::Row) -> rusqlite::Result<RatingHistoryEntry> {
    Ok(RatingHistoryEntry {
        id: row.get(0)?,
        player_id: row.get(1)?,
        match_id: row.get(2)?,
        old_elo: row.get(3)?,
        new_elo: row.get(4)?,
        date: row.get(5)?,
    })
}

fn decode_roster(idx: usize, text: &str) -> rusqlite::Result<Vec<PlayerId>> {
    serde_json::from_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<Match> {
    let team1: String = row.get(3)?;
    let team2: String = row.get(4)?;
    Ok(Match {
        id: row.get(0)?,
        date: row.get(1)?,
        name: row.get(2)?,
        team1_players: decode_roster(3, &team1)?,
        team2_players: decode_roster(4, &team2)?,
        team1_score: row.get(5)?,
        team2_score: row.get(6)?,
        team1_elo_change: row.get(7)?,
        team2_elo_change: row.get(8)?,
    })
}

struct SqliteTransaction<'t> {
    conn: &'t Connection,
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn fetch_players(&mut self, ids: &BTreeSet<PlayerId>) -> Result<HashMap<PlayerId, Player>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT {} FROM players WHERE id IN ({})",
            PLAYER_COLUMNS, placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), parse_player_row)?
            .map(|row| row.map(|player| (player.id, player)))
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;

        ensure_complete(ids, &found)?;
        Ok(found)
    }

    fn create_match(&mut self, record: &NewMatch) -> Result<MatchId> {
        let sql = "INSERT INTO matches (date, name, team1_players, team2_players, team1_score, \
                   team2_score, team1_elo_change, team2_elo_change) \
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id";

        let id = self.conn.query_row(
            sql,
            params![
                record.date,
                record.name,
                serde_json::to_string(&record.team1_players)?,
                serde_json::to_string(&record.team2_players)?,
                record.team1_score,
                record.team2_score,
                record.team1_elo_change,
                record.team2_elo_change,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn update_player(&mut self, update: &PlayerUpdate) -> Result<()> {
        let sql = "UPDATE players SET elo = ?1, matches = ?2, wins = ?3, losses = ?4, draws = ?5 \
                   WHERE id = ?6";

        let changed = self.conn.execute(
            sql,
            params![
                update.rating,
                update.matches,
                update.wins,
                update.losses,
                update.draws,
                update.player_id,
            ],
        )?;

        if changed == 0 {
            return Err(LeagueError::UnknownPlayer {
                player_ids: vec![update.player_id],
            });
        }
        Ok(())
    }

    fn append_history_entry(&mut self, entry: &NewHistoryEntry) -> Result<HistoryId> {
        let sql = "INSERT INTO player_history (player_id, match_id, old_elo, new_elo, date) \
                   VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id";

        let id = self.conn.query_row(
            sql,
            params![
                entry.player_id,
                entry.match_id,
                entry.old_elo,
                entry.new_elo,
                entry.date
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

impl RatingStore for SqliteRatingStore {
    fn run_atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Dropping `tx` on the error path rolls back
        let value = work(&mut SqliteTransaction { conn: &tx })?;

        tx.commit()?;
        Ok(value)
    }

    fn create_player(&self, name: &str, rating: i64) -> Result<Player> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO players (name, elo, matches, wins, losses, draws) \
             VALUES (?1, ?2, 0, 0, 0, 0) RETURNING {}",
            PLAYER_COLUMNS
        );

        let player = conn.query_row(&sql, params![name, rating], parse_player_row)?;
        Ok(player)
    }

    fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM players WHERE id = ?1", PLAYER_COLUMNS);

        let player = conn
            .query_row(&sql, params![player_id], parse_player_row)
            .optional()?;
        Ok(player)
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM players ORDER BY elo DESC, id ASC",
            PLAYER_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let players = stmt
            .query_map([], parse_player_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }

    fn player_history(
        &self,
        player_id: PlayerId,
        limit: Option<usize>,
    ) -> Result<Vec<RatingHistoryEntry>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM player_history WHERE player_id = ?1 \
             ORDER BY date DESC, id DESC LIMIT ?2",
            HISTORY_COLUMNS
        );

        // SQLite treats a negative LIMIT as unlimited
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![player_id, limit], parse_history_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn match_history(&self, match_id: MatchId) -> Result<Vec<RatingHistoryEntry>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM player_history WHERE match_id = ?1 ORDER BY id ASC",
            HISTORY_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![match_id], parse_history_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn list_matches(&self) -> Result<Vec<Match>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM matches ORDER BY date DESC, id DESC",
            MATCH_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let matches = stmt
            .query_map([], parse_match_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_match(team1: Vec<PlayerId>, team2: Vec<PlayerId>) -> NewMatch {
        NewMatch {
            date: Utc.with_ymd_and_hms(2024, 6, 2, 10, 30, 0).unwrap(),
            name: "Five-a-side".to_string(),
            team1_players: team1,
            team2_players: team2,
            team1_score: 2,
            team2_score: 2,
            team1_elo_change: 0.0,
            team2_elo_change: 0.0,
        }
    }

    #[test]
    fn test_player_round_trip() {
        let store = SqliteRatingStore::open_in_memory().unwrap();
        let created = store.create_player("Keeper", 1200).unwrap();

        assert_eq!(created.rating, 1200);
        assert_eq!(store.get_player(created.id).unwrap(), Some(created));
        assert_eq!(store.get_player(404).unwrap(), None);
    }

    #[test]
    fn test_match_rosters_survive_storage() {
        let store = SqliteRatingStore::open_in_memory().unwrap();
        let a = store.create_player("A", 1200).unwrap();
        let b = store.create_player("B", 1200).unwrap();

        let record = create_test_match(vec![b.id], vec![a.id]);
        let id = store.run_atomically(|tx| tx.create_match(&record)).unwrap();

        let matches = store.list_matches().unwrap();
        assert_eq!(matches, vec![record.into_match(id)]);
    }

    #[test]
    fn test_fetch_reports_missing_players() {
        let store = SqliteRatingStore::open_in_memory().unwrap();
        let a = store.create_player("A", 1200).unwrap();

        let ids: BTreeSet<PlayerId> = [a.id, 77].into_iter().collect();
        let result = store.run_atomically(|tx| tx.fetch_players(&ids));

        assert_eq!(
            result,
            Err(LeagueError::UnknownPlayer {
                player_ids: vec![77]
            })
        );
    }

    #[test]
    fn test_failed_unit_rolls_back() {
        let store = SqliteRatingStore::open_in_memory().unwrap();
        let a = store.create_player("A", 1200).unwrap();

        let result: Result<()> = store.run_atomically(|tx| {
            let match_id = tx.create_match(&create_test_match(vec![a.id], vec![]))?;
            tx.update_player(&PlayerUpdate {
                player_id: a.id,
                rating: 1190,
                matches: 1,
                wins: 0,
                losses: 1,
                draws: 0,
            })?;
            // Foreign key violation aborts the unit
            tx.append_history_entry(&NewHistoryEntry {
                player_id: 999,
                match_id,
                old_elo: 1200,
                new_elo: 1190,
                date: Utc::now(),
            })?;
            Ok(())
        });

        assert!(matches!(
            result,
            Err(LeagueError::PersistenceFailure { .. })
        ));
        assert!(store.list_matches().unwrap().is_empty());
        assert_eq!(store.get_player(a.id).unwrap().unwrap().rating, 1200);
    }

    #[test]
    fn test_history_ordering_and_limit() {
        let store = SqliteRatingStore::open_in_memory().unwrap();
        let a = store.create_player("A", 1200).unwrap();

        for new_elo in [1216, 1201, 1187] {
            store
                .run_atomically(|tx| {
                    let match_id = tx.create_match(&create_test_match(vec![a.id], vec![]))?;
                    tx.append_history_entry(&NewHistoryEntry {
                        player_id: a.id,
                        match_id,
                        old_elo: 0,
                        new_elo,
                        date: Utc.with_ymd_and_hms(2024, 6, 2, 10, 30, 0).unwrap(),
                    })
                })
                .unwrap();
        }

        let all = store.player_history(a.id, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].new_elo, 1187);

        let recent = store.player_history(a.id, Some(1)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].new_elo, 1187);
    }
}
