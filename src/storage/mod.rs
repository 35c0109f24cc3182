//! Persistence for players, matches and rating history
//!
//! This module defines the transactional storage contract the match recorder
//! relies on, with in-memory and SQLite implementations.

pub mod memory;
pub mod sqlite;
pub mod store;

// Re-export commonly used types
pub use memory::InMemoryRatingStore;
pub use sqlite::SqliteRatingStore;
pub use store::{NewHistoryEntry, NewMatch, PlayerUpdate, RatingStore, StoreTransaction};
