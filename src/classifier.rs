//! Client for the remote image-similarity classifier.
//!
//! The classifier is an opaque, best-effort, possibly-slow scoring oracle:
//! one uploaded photo in, a ranked match list out. The core only consumes
//! that list — nothing here constrains the endpoint's internals.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SYNTHETIC_ID_PREFIX;

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

/// One ranked match from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPayload {
    #[serde(default)]
    pub hospital: String,
    #[serde(default)]
    pub before_url: String,
    #[serde(default)]
    pub after_url: String,
    /// Similarity to the uploaded photo, [0,1].
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub aspect_ratio: f64,
}

/// Response body from POST /api/analyze
#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub matches: Vec<MatchPayload>,
}

/// Response body from GET /health
#[derive(Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: String,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from classifier calls. Callers fall back to the store-backed
/// feed on any of these rather than showing nothing.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Cannot reach classifier at {0}")]
    Connection(String),

    #[error("Classifier request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Classifier returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Failed to parse classifier response: {0}")]
    ResponseParsing(String),
}

// ═══════════════════════════════════════════════════════════
// ClassifierClient
// ═══════════════════════════════════════════════════════════

/// HTTP client for the similarity endpoint.
pub struct ClassifierClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ClassifierClient {
    /// Create a client for the given endpoint.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a photo and return the ranked match list.
    ///
    /// `file_name` determines the part's mime subtype, matching what the
    /// endpoint expects from the mobile uploader.
    pub fn analyze_photo(
        &self,
        photo: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<MatchPayload>, ClassifierError> {
        let url = format!("{}/api/analyze", self.base_url);
        let mime = format!("image/{}", file_extension(file_name));

        let part = reqwest::blocking::multipart::Part::bytes(photo)
            .file_name(file_name.to_string())
            .mime_str(&mime)
            .map_err(|e| ClassifierError::HttpClient(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new().part("photo", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifierError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .map_err(|e| ClassifierError::ResponseParsing(e.to_string()))?;

        if !parsed.success {
            tracing::warn!(
                count = parsed.count,
                "classifier reported failure, using whatever matches it sent",
            );
        }
        tracing::debug!(count = parsed.matches.len(), "classifier analysis done");
        Ok(parsed.matches)
    }

    /// Is the classifier up? False on any failure — callers only need a
    /// go/no-go before offering the photo flow.
    pub fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let response = match self.client.get(&url).send() {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("classifier health check failed: {e}");
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }
        match response.json::<HealthResponse>() {
            Ok(health) => health.status == "healthy",
            Err(_) => false,
        }
    }

    fn classify_send_error(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_connect() {
            ClassifierError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ClassifierError::Timeout(self.timeout_secs)
        } else {
            ClassifierError::HttpClient(e.to_string())
        }
    }
}

fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or("jpeg")
}

// ═══════════════════════════════════════════════════════════
// Match → raw record conversion
// ═══════════════════════════════════════════════════════════

/// Convert classifier matches into raw records for the normalizer.
///
/// Ids are synthetic (`ai_1`, `ai_2`, … in input order) — these records
/// have no backing catalog document and must never reach a remote write.
pub fn matches_to_records(matches: &[MatchPayload]) -> Vec<Map<String, Value>> {
    matches
        .iter()
        .enumerate()
        .map(|(index, m)| {
            let mut record = Map::new();
            record.insert(
                "id".into(),
                Value::String(format!("{}{}", SYNTHETIC_ID_PREFIX, index + 1)),
            );
            record.insert("hospital_name".into(), Value::String(m.hospital.clone()));
            record.insert("before_img".into(), Value::String(m.before_url.clone()));
            record.insert("after_img".into(), Value::String(m.after_url.clone()));
            record.insert("procedures".into(), Value::String(m.label.clone()));
            record.insert("similarity".into(), json_number(m.similarity));
            record.insert("aspect_ratio".into(), json_number(m.aspect_ratio));
            record
        })
        .collect()
}

fn json_number(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
