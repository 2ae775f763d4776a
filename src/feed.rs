//! Similarity Feed Builder — the ordered, deduplicated, capped list of
//! items shown for one query context.
//!
//! Classifier matches are the primary source; the remote catalog is the
//! fallback. Feeds are always rebuilt, never persisted. A store failure is
//! surfaced as [`FeedError::LoadFailed`] so the caller can tell "could not
//! load" apart from "loaded, zero results".

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::classifier::{matches_to_records, MatchPayload};
use crate::config::{BROWSE_FEED_LIMIT, CATALOG_FETCH_LIMIT, HOME_FEED_LIMIT};
use crate::models::{Item, SortKey};
use crate::normalize::normalize_record;
use crate::remote::{ItemStore, StoreError};

/// Over-fetch multiplier for store-backed feeds, leaving headroom for the
/// normalizer's invalid-drop.
const OVER_FETCH_FACTOR: usize = 10;

// ═══════════════════════════════════════════════════════════
// Request
// ═══════════════════════════════════════════════════════════

/// One feed query: result cap plus sort key.
#[derive(Debug, Clone, Copy)]
pub struct FeedRequest {
    pub limit: usize,
    pub sort: SortKey,
}

impl FeedRequest {
    /// Home screen context: small cap, similarity-first.
    pub fn home() -> Self {
        Self {
            limit: HOME_FEED_LIMIT,
            sort: SortKey::Similarity,
        }
    }

    /// Browse-all context: larger cap, caller-chosen sort tab.
    pub fn browse(sort: SortKey) -> Self {
        Self {
            limit: BROWSE_FEED_LIMIT,
            sort,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The backing source was unavailable. Distinct from an empty feed —
    /// the caller owes the user a retry affordance, not a blank list.
    #[error("Could not load feed: {0}")]
    LoadFailed(#[from] StoreError),
}

// ═══════════════════════════════════════════════════════════
// build_feed
// ═══════════════════════════════════════════════════════════

/// Build the feed for one query context.
///
/// With non-empty classifier `matches`, the feed is those matches
/// normalized, valid-only, similarity-descending, capped — the requested
/// sort key does not apply, a similarity query is always shown by
/// similarity. Otherwise the catalog is over-fetched and sorted by the
/// requested key. Output is deterministic: stable sort, ties keep input
/// order.
pub fn build_feed<S: ItemStore + ?Sized>(
    matches: Option<&[MatchPayload]>,
    store: &S,
    request: &FeedRequest,
) -> Result<Vec<Item>, FeedError> {
    if let Some(matches) = matches {
        if !matches.is_empty() {
            return Ok(feed_from_matches(matches, request.limit));
        }
    }
    feed_from_store(store, request)
}

/// Feed from a classifier result, for the lifetime of one query.
pub fn feed_from_matches(matches: &[MatchPayload], limit: usize) -> Vec<Item> {
    let records = matches_to_records(matches);
    let mut items = normalize_valid(records.iter());
    sort_items(&mut items, SortKey::Similarity);
    items.truncate(limit);
    items
}

fn feed_from_store<S: ItemStore + ?Sized>(
    store: &S,
    request: &FeedRequest,
) -> Result<Vec<Item>, FeedError> {
    let bound = request
        .limit
        .saturating_mul(OVER_FETCH_FACTOR)
        .min(CATALOG_FETCH_LIMIT)
        .max(request.limit);

    let documents = store.fetch_all(bound).map_err(|e| {
        tracing::warn!("feed load failed: {e}");
        FeedError::LoadFailed(e)
    })?;

    let mut items = normalize_valid(documents.iter());
    sort_items(&mut items, request.sort);
    items.truncate(request.limit);
    Ok(items)
}

/// Normalize raw records, drop invalid ones, and deduplicate by id
/// (first occurrence wins; records without an id are kept as-is).
fn normalize_valid<'a, I>(records: I) -> Vec<Item>
where
    I: Iterator<Item = &'a crate::remote::RawDocument>,
{
    let mut seen: HashSet<String> = HashSet::new();
    records
        .filter_map(normalize_record)
        .filter(|item| item.id.is_empty() || seen.insert(item.id.clone()))
        .collect()
}

/// Stable descending sort by the chosen key.
fn sort_items(items: &mut [Item], key: SortKey) {
    items.sort_by(|a, b| {
        sort_value(b, key)
            .partial_cmp(&sort_value(a, key))
            .unwrap_or(Ordering::Equal)
    });
}

fn sort_value(item: &Item, key: SortKey) -> f64 {
    match key {
        SortKey::Similarity => item.similarity.unwrap_or(0.0),
        SortKey::Likes => item.like_count as f64,
        SortKey::Views => item.view_count as f64,
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
