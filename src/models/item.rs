use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SYNTHETIC_ID_PREFIX;

/// Canonical before/after result record.
///
/// Produced only by the normalizer; anything holding an `Item` may assume
/// both asset references are non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque id. Classifier-sourced items carry the `ai_` prefix and are
    /// never persisted remotely.
    pub id: String,
    pub hospital_name: String,
    pub doctor_name: String,
    pub procedure_label: String,
    /// Retrievable URL of the "before" asset. Non-empty.
    pub before_asset: String,
    /// Retrievable URL of the "after" asset. Non-empty.
    pub after_asset: String,
    /// Similarity to the query photo in [0,1]. `None` means not applicable,
    /// not "no similarity".
    pub similarity: Option<f64>,
    pub like_count: i64,
    pub view_count: i64,
    /// Display-only passthrough fields (cost, keywords, style scores).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl Item {
    /// Whether this item came from the classifier and has no backing
    /// document in the remote catalog.
    pub fn is_synthetic(&self) -> bool {
        self.id.starts_with(SYNTHETIC_ID_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            hospital_name: String::new(),
            doctor_name: String::new(),
            procedure_label: String::new(),
            before_asset: "https://example.com/b.jpg".into(),
            after_asset: "https://example.com/a.jpg".into(),
            similarity: None,
            like_count: 0,
            view_count: 0,
            extras: Map::new(),
        }
    }

    #[test]
    fn classifier_ids_are_synthetic() {
        assert!(item("ai_1").is_synthetic());
        assert!(!item("r42").is_synthetic());
    }

    #[test]
    fn empty_extras_not_serialized() {
        let json = serde_json::to_string(&item("r1")).unwrap();
        assert!(!json.contains("extras"));
    }
}
