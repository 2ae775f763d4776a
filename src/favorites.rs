//! Local Favorite Store — durable per-device set of liked item ids.
//!
//! The liked set lives entirely on this device, independent of the remote
//! catalog's like counters; the two are reconciled only at read time
//! (saved-items intersection) and write time (best-effort counter push).
//! Persisted shape is one KV row holding a JSON array of ids, so the whole
//! set is read, mutated, and written back on every toggle —
//! last-writer-wins, which is fine with exactly one foreground writer.
//!
//! The trait exists so call sites can take an injected store and tests can
//! swap in the in-memory fake.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::config::LIKED_IDS_KEY;
use crate::db::{self, StorageError};

// ═══════════════════════════════════════════════════════════
// FavoriteStore trait
// ═══════════════════════════════════════════════════════════

/// Per-device liked-id set.
///
/// All operations are must-not-fail from the caller's perspective: any
/// internal storage failure degrades to `false`/empty rather than erroring,
/// since losing a like silently beats crashing navigation.
pub trait FavoriteStore: Send + Sync {
    /// Membership test. Never errors; false on any read failure.
    fn contains(&self, id: &str) -> bool;

    /// Full membership snapshot. Empty on any read failure.
    fn list(&self) -> Vec<String>;

    /// Flip membership, persist, and return the resulting state
    /// (true = now liked). Safe to call repeatedly on the same id.
    fn toggle(&self, id: &str) -> bool;
}

// ═══════════════════════════════════════════════════════════
// SqliteFavoriteStore
// ═══════════════════════════════════════════════════════════

/// Durable favorite store over the local KV table.
pub struct SqliteFavoriteStore {
    conn: Mutex<Connection>,
}

impl SqliteFavoriteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (and migrate) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(db::open_database(path)?))
    }

    fn read_ids(&self) -> Vec<String> {
        let Ok(conn) = self.conn.lock() else {
            return Vec::new();
        };
        match db::get_value(&conn, LIKED_IDS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("liked-id set is corrupt, treating as empty: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read liked-id set: {e}");
                Vec::new()
            }
        }
    }

    fn write_ids(&self, ids: &[String]) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::CorruptValue {
            key: LIKED_IDS_KEY.to_string(),
            reason: "connection lock poisoned".to_string(),
        })?;
        let json = serde_json::to_string(ids).map_err(|e| StorageError::CorruptValue {
            key: LIKED_IDS_KEY.to_string(),
            reason: e.to_string(),
        })?;
        db::set_value(&conn, LIKED_IDS_KEY, &json)
    }
}

impl FavoriteStore for SqliteFavoriteStore {
    fn contains(&self, id: &str) -> bool {
        !id.is_empty() && self.read_ids().iter().any(|x| x == id)
    }

    fn list(&self) -> Vec<String> {
        self.read_ids()
    }

    fn toggle(&self, id: &str) -> bool {
        if id.is_empty() {
            tracing::warn!("toggle called without an id");
            return false;
        }
        let mut ids = self.read_ids();
        let now_liked = match ids.iter().position(|x| x == id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(id.to_string());
                true
            }
        };
        if let Err(e) = self.write_ids(&ids) {
            tracing::warn!(id, "failed to persist liked-id set: {e}");
        }
        now_liked
    }
}

// ═══════════════════════════════════════════════════════════
// MemoryFavoriteStore — test fake
// ═══════════════════════════════════════════════════════════

/// In-memory favorite store with the same toggle semantics.
#[derive(Default)]
pub struct MemoryFavoriteStore {
    ids: Mutex<Vec<String>>,
}

impl MemoryFavoriteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoriteStore for MemoryFavoriteStore {
    fn contains(&self, id: &str) -> bool {
        !id.is_empty()
            && self
                .ids
                .lock()
                .map(|ids| ids.iter().any(|x| x == id))
                .unwrap_or(false)
    }

    fn list(&self) -> Vec<String> {
        self.ids.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    fn toggle(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        let Ok(mut ids) = self.ids.lock() else {
            return false;
        };
        match ids.iter().position(|x| x == id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(id.to_string());
                true
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn sqlite_store() -> SqliteFavoriteStore {
        SqliteFavoriteStore::new(open_memory_database().unwrap())
    }

    #[test]
    fn first_run_is_empty() {
        let store = sqlite_store();
        assert!(store.list().is_empty());
        assert!(!store.contains("r1"));
    }

    #[test]
    fn toggle_pair_restores_initial_state() {
        let store = sqlite_store();
        assert!(store.toggle("r1"));
        assert!(store.contains("r1"));
        assert!(!store.toggle("r1"));
        assert!(!store.contains("r1"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn toggle_tracks_multiple_ids_independently() {
        let store = sqlite_store();
        store.toggle("r1");
        store.toggle("r2");
        store.toggle("r1");
        assert_eq!(store.list(), vec!["r2".to_string()]);
    }

    #[test]
    fn empty_id_is_refused() {
        let store = sqlite_store();
        assert!(!store.toggle(""));
        assert!(!store.contains(""));
        assert!(store.list().is_empty());
    }

    #[test]
    fn rapid_repeated_toggles_stay_consistent() {
        let store = sqlite_store();
        for _ in 0..25 {
            store.toggle("r1");
        }
        // Odd number of toggles: liked.
        assert!(store.contains("r1"));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn corrupt_persisted_value_degrades_to_empty() {
        let conn = open_memory_database().unwrap();
        crate::db::set_value(&conn, LIKED_IDS_KEY, "{not json").unwrap();
        let store = SqliteFavoriteStore::new(conn);
        assert!(store.list().is_empty());
        // Next toggle writes a clean array over the corrupt value.
        assert!(store.toggle("r1"));
        assert_eq!(store.list(), vec!["r1".to_string()]);
    }

    #[test]
    fn set_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.db");
        {
            let store = SqliteFavoriteStore::open(&path).unwrap();
            assert!(store.toggle("r1"));
            assert!(store.toggle("r2"));
            assert!(!store.toggle("r2"));
        }
        let reopened = SqliteFavoriteStore::open(&path).unwrap();
        assert_eq!(reopened.list(), vec!["r1".to_string()]);
    }

    #[test]
    fn memory_fake_matches_sqlite_semantics() {
        let store = MemoryFavoriteStore::new();
        assert!(store.toggle("r1"));
        assert!(store.contains("r1"));
        assert!(!store.toggle("r1"));
        assert!(!store.contains("r1"));
        assert!(!store.toggle(""));
    }
}
