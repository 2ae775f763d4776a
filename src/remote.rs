//! Remote Item Store Gateway — thin, bounded access to the review catalog.
//!
//! The catalog is the single source of truth for content and engagement
//! counters. This layer never sees canonical [`Item`]s: it hands raw
//! documents to the normalizer and applies exactly one schema rule of its
//! own, "a document must carry both asset fields".

use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::config::CATALOG_FETCH_LIMIT;

/// A catalog document as fetched: a flat JSON map of unknown shape.
pub type RawDocument = Map<String, Value>;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot reach item store at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Item store returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Failed to decode store document: {0}")]
    Decode(String),
}

// ═══════════════════════════════════════════════════════════
// ItemStore trait
// ═══════════════════════════════════════════════════════════

/// Bounded access to the remote review catalog.
pub trait ItemStore: Send + Sync {
    /// Up to `limit` documents that carry both asset fields. The filter is
    /// applied here, not left to callers.
    fn fetch_all(&self, limit: usize) -> Result<Vec<RawDocument>, StoreError>;

    /// One document, or `None` if the id is unknown.
    fn fetch_by_id(&self, id: &str) -> Result<Option<RawDocument>, StoreError>;

    /// Atomic server-side adjustment of the like counter. Best-effort from
    /// the caller's perspective — see the engagement layer.
    fn increment_like_count(&self, id: &str, delta: i64) -> Result<(), StoreError>;

    /// Documents for one hospital. Client-side filter over a `fetch_all`
    /// superset: the catalog is small and the store has no indexed query
    /// in this design. A scalability ceiling, not a correctness one.
    fn fetch_by_hospital(&self, name: &str, limit: usize) -> Result<Vec<RawDocument>, StoreError> {
        let all = self.fetch_all(CATALOG_FETCH_LIMIT)?;
        Ok(all
            .into_iter()
            .filter(|doc| field_matches(doc, &["hospitalName", "hospital_name"], name))
            .take(limit)
            .collect())
    }

    /// Documents for one doctor. Same client-side filter as
    /// [`ItemStore::fetch_by_hospital`].
    fn fetch_by_doctor(&self, name: &str, limit: usize) -> Result<Vec<RawDocument>, StoreError> {
        let all = self.fetch_all(CATALOG_FETCH_LIMIT)?;
        Ok(all
            .into_iter()
            .filter(|doc| field_matches(doc, &["doctorName", "doctor_name"], name))
            .take(limit)
            .collect())
    }
}

/// Does the document carry both asset fields under either alias pair?
pub(crate) fn has_both_assets(doc: &RawDocument) -> bool {
    let present = |key: &str| matches!(doc.get(key), Some(Value::String(s)) if !s.is_empty());
    (present("beforeImageUrl") && present("afterImageUrl"))
        || (present("before_img") && present("after_img"))
}

fn field_matches(doc: &RawDocument, aliases: &[&str], expected: &str) -> bool {
    aliases
        .iter()
        .any(|key| matches!(doc.get(*key), Some(Value::String(s)) if s == expected))
}

// ═══════════════════════════════════════════════════════════
// RestItemStore
// ═══════════════════════════════════════════════════════════

/// HTTP implementation over the catalog's document REST surface.
pub struct RestItemStore {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RestItemStore {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_connect() {
            StoreError::Connection(self.base_url.clone())
        } else {
            StoreError::HttpClient(e.to_string())
        }
    }
}

impl ItemStore for RestItemStore {
    fn fetch_all(&self, limit: usize) -> Result<Vec<RawDocument>, StoreError> {
        let url = format!("{}/reviews?limit={}", self.base_url, limit);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let documents: Vec<RawDocument> = response
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        // The server may ignore the limit hint; the bound holds here.
        Ok(documents
            .into_iter()
            .filter(has_both_assets)
            .take(limit)
            .collect())
    }

    fn fetch_by_id(&self, id: &str) -> Result<Option<RawDocument>, StoreError> {
        let url = format!("{}/reviews/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let document: RawDocument = response
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(document))
    }

    fn increment_like_count(&self, id: &str, delta: i64) -> Result<(), StoreError> {
        let url = format!("{}/reviews/{}/increment", self.base_url, id);
        let body = serde_json::json!({ "field": "likeCount", "delta": delta });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// MockItemStore — test fake
// ═══════════════════════════════════════════════════════════

/// In-memory catalog for tests: seeded documents, the same both-assets
/// filter as the REST impl, a failure switch, and a recorded increment log.
#[derive(Default)]
pub struct MockItemStore {
    documents: Vec<RawDocument>,
    fail: bool,
    increments: Mutex<Vec<(String, i64)>>,
}

impl MockItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(mut self, documents: Vec<RawDocument>) -> Self {
        self.documents = documents;
        self
    }

    /// Make every operation fail with a connection error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Increments recorded so far, in call order.
    pub fn recorded_increments(&self) -> Vec<(String, i64)> {
        self.increments.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Connection("mock://down".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ItemStore for MockItemStore {
    fn fetch_all(&self, limit: usize) -> Result<Vec<RawDocument>, StoreError> {
        self.check()?;
        Ok(self
            .documents
            .iter()
            .filter(|doc| has_both_assets(doc))
            .take(limit)
            .cloned()
            .collect())
    }

    fn fetch_by_id(&self, id: &str) -> Result<Option<RawDocument>, StoreError> {
        self.check()?;
        Ok(self
            .documents
            .iter()
            .find(|doc| matches!(doc.get("id"), Some(Value::String(s)) if s == id))
            .cloned())
    }

    fn increment_like_count(&self, id: &str, delta: i64) -> Result<(), StoreError> {
        self.check()?;
        if let Ok(mut increments) = self.increments.lock() {
            increments.push((id.to_string(), delta));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
