//! Utility functions for the rating service

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Trimmed name, or `None` if nothing but whitespace is left
pub fn clean_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Match name from an optional request field, falling back to `default`
pub fn match_name_or(name: Option<&str>, default: &str) -> String {
    name.and_then(clean_name).unwrap_or_else(|| default.to_string())
}
