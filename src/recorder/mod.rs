//! Match recording
//!
//! Orchestrates one match submission: validation, the pure rating plan and
//! the transactional commit of every resulting state change.

pub mod match_recorder;

pub use match_recorder::{validate_rosters, MatchRecorder, DEFAULT_MATCH_NAME};
