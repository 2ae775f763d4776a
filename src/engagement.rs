//! Like/Save Reconciliation — one user action, two stores.
//!
//! The local favorite set is authoritative for "is this liked on this
//! device"; the remote like counter is eventually-consistent and allowed
//! to drift or fail silently. The two meet only here: dual write on
//! toggle, id-set intersection on read.

use std::collections::HashSet;

use crate::config::SAVED_FETCH_LIMIT;
use crate::favorites::FavoriteStore;
use crate::models::Item;
use crate::normalize::normalize_record;
use crate::remote::{ItemStore, StoreError};

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Resulting local state: true = now liked.
    pub liked: bool,
    /// Advisory display count with the optimistic ±1 applied. Never
    /// persisted anywhere; re-derived from server truth on next reload.
    pub display_like_count: i64,
}

/// Coordinates a user's like actions across the local and remote stores.
pub struct Engagement<'a> {
    store: &'a dyn ItemStore,
    favorites: &'a dyn FavoriteStore,
}

impl<'a> Engagement<'a> {
    pub fn new(store: &'a dyn ItemStore, favorites: &'a dyn FavoriteStore) -> Self {
        Self { store, favorites }
    }

    /// Toggle an item's liked state.
    ///
    /// The local write is sequenced first and stands regardless of the
    /// remote outcome. The remote counter push is best-effort, skipped
    /// entirely for synthetic ids (no backing document), and its failure
    /// is logged, not retried, not surfaced.
    pub fn toggle_like(&self, item: &Item) -> ToggleOutcome {
        if item.id.is_empty() {
            tracing::warn!("toggle_like called on an item without an id");
            return ToggleOutcome {
                liked: false,
                display_like_count: item.like_count,
            };
        }

        let liked = self.favorites.toggle(&item.id);
        let delta: i64 = if liked { 1 } else { -1 };
        let display_like_count = (item.like_count + delta).max(0);

        if item.is_synthetic() {
            tracing::debug!(id = %item.id, "synthetic item, skipping remote counter");
        } else if let Err(e) = self.store.increment_like_count(&item.id, delta) {
            tracing::warn!(id = %item.id, "best-effort like counter push failed: {e}");
        }

        ToggleOutcome {
            liked,
            display_like_count,
        }
    }

    /// Is this item liked on this device?
    pub fn is_liked(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    /// The saved-items view: liked ids × catalog, normalized, valid-only.
    ///
    /// Order is stable relative to store fetch order; callers needing a
    /// specific order sort explicitly.
    pub fn saved_items(&self) -> Result<Vec<Item>, StoreError> {
        let ids = self.favorites.list();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // The store has no fetch-by-id-list primitive; over-fetch and
        // intersect client-side.
        let documents = self.store.fetch_all(SAVED_FETCH_LIMIT)?;
        let liked: HashSet<&str> = ids.iter().map(String::as_str).collect();

        Ok(documents
            .iter()
            .filter_map(normalize_record)
            .filter(|item| liked.contains(item.id.as_str()))
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
