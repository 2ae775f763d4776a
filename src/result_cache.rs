//! Cache of the most recent classifier result.
//!
//! Lets a later screen redisplay the last similarity query without
//! re-uploading a photo. One KV row, overwritten on every analysis.

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::classifier::MatchPayload;
use crate::config::LATEST_MATCHES_KEY;
use crate::db::{self, StorageError};

#[derive(Serialize, Deserialize)]
struct CachedMatches {
    /// When the analysis ran (ISO 8601).
    cached_at: String,
    matches: Vec<MatchPayload>,
}

/// Persist the latest classifier match list, replacing any previous one.
pub fn save_latest_matches(
    conn: &Connection,
    matches: &[MatchPayload],
) -> Result<(), StorageError> {
    let cached = CachedMatches {
        cached_at: Utc::now().to_rfc3339(),
        matches: matches.to_vec(),
    };
    let json = serde_json::to_string(&cached).map_err(|e| StorageError::CorruptValue {
        key: LATEST_MATCHES_KEY.to_string(),
        reason: e.to_string(),
    })?;
    db::set_value(conn, LATEST_MATCHES_KEY, &json)
}

/// Load the latest cached match list. `None` when nothing is cached or
/// the payload no longer parses (stale schema is treated as absent, not
/// an error).
pub fn load_latest_matches(conn: &Connection) -> Option<Vec<MatchPayload>> {
    let json = match db::get_value(conn, LATEST_MATCHES_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("failed to read cached classifier result: {e}");
            return None;
        }
    };
    match serde_json::from_str::<CachedMatches>(&json) {
        Ok(cached) => Some(cached.matches),
        Err(e) => {
            tracing::warn!("cached classifier result is corrupt, ignoring: {e}");
            None
        }
    }
}

/// Drop the cached result.
pub fn clear_latest_matches(conn: &Connection) -> Result<(), StorageError> {
    db::delete_value(conn, LATEST_MATCHES_KEY)
}
