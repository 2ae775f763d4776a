//! Match Normalizer — folds the three raw record shapes reaching the core
//! (remote catalog document, classifier match, navigation parameter bag)
//! into one canonical [`Item`], or rejects the record.
//!
//! **Design**: one pass over a fixed alias table per target field instead
//! of three parallel code paths. Which shape a record came from is only
//! visible through which aliases matched, never as an explicit tag — the
//! shapes are structurally compatible after alias resolution.
//!
//! Pure transforms only; no storage or network access here.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::models::Item;

// ═══════════════════════════════════════════════════════════
// Field alias tables
// ═══════════════════════════════════════════════════════════

// Priority order: primary catalog name, legacy export names, classifier
// names. First non-empty value wins.
const ID_ALIASES: &[&str] = &["id"];
const HOSPITAL_ALIASES: &[&str] = &["hospitalName", "hospital_name", "hospital"];
const DOCTOR_ALIASES: &[&str] = &["doctorName", "doctor_name"];
const PROCEDURE_ALIASES: &[&str] = &["procedures", "procedure", "label"];
const BEFORE_ALIASES: &[&str] = &["beforeImageUrl", "before_img", "beforeUrl", "before_url"];
const AFTER_ALIASES: &[&str] = &["afterImageUrl", "after_img", "afterUrl", "after_url"];
const SIMILARITY_ALIASES: &[&str] = &["similarity"];
const LIKE_ALIASES: &[&str] = &["likeCount", "likes"];
const VIEW_ALIASES: &[&str] = &["viewCount", "views"];

const ALL_ALIASES: &[&[&str]] = &[
    ID_ALIASES,
    HOSPITAL_ALIASES,
    DOCTOR_ALIASES,
    PROCEDURE_ALIASES,
    BEFORE_ALIASES,
    AFTER_ALIASES,
    SIMILARITY_ALIASES,
    LIKE_ALIASES,
    VIEW_ALIASES,
];

// ═══════════════════════════════════════════════════════════
// normalize_record
// ═══════════════════════════════════════════════════════════

/// Normalize a raw record of unknown shape into a canonical [`Item`].
///
/// Returns `None` iff either asset reference resolves empty after fixup —
/// such records are invalid and must be excluded from any feed.
pub fn normalize_record(raw: &Map<String, Value>) -> Option<Item> {
    let before_asset = repair_asset_url(&first_string(raw, BEFORE_ALIASES).unwrap_or_default());
    let after_asset = repair_asset_url(&first_string(raw, AFTER_ALIASES).unwrap_or_default());

    if before_asset.is_empty() || after_asset.is_empty() {
        tracing::debug!("dropping record without both asset references");
        return None;
    }

    let similarity = first_number(raw, SIMILARITY_ALIASES)
        .map(fold_similarity_scale)
        // Zero means "not applicable", not "no similarity".
        .filter(|s| *s > 0.0);

    Some(Item {
        id: first_string(raw, ID_ALIASES).unwrap_or_default(),
        hospital_name: first_string(raw, HOSPITAL_ALIASES).unwrap_or_default(),
        doctor_name: first_string(raw, DOCTOR_ALIASES).unwrap_or_default(),
        procedure_label: first_string(raw, PROCEDURE_ALIASES).unwrap_or_default(),
        before_asset,
        after_asset,
        similarity,
        like_count: first_count(raw, LIKE_ALIASES),
        view_count: first_count(raw, VIEW_ALIASES),
        extras: passthrough_extras(raw),
    })
}

/// First non-empty string under any alias. Numbers are accepted and
/// stringified — navigation bags carry numeric ids.
fn first_string(raw: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        match raw.get(*alias) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}

/// First numeric value under any alias. Stringified numbers are accepted —
/// navigation bags carry counts as strings.
fn first_number(raw: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    for alias in aliases {
        match raw.get(*alias) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(v) = s.parse::<f64>() {
                    return Some(v);
                }
            }
            _ => continue,
        }
    }
    None
}

fn first_count(raw: &Map<String, Value>, aliases: &[&str]) -> i64 {
    first_number(raw, aliases).map(|v| (v as i64).max(0)).unwrap_or(0)
}

/// Fold a similarity value onto [0,1]. Legacy records carry percentages.
fn fold_similarity_scale(value: f64) -> f64 {
    let v = if value > 1.0 { value / 100.0 } else { value };
    v.clamp(0.0, 1.0)
}

/// Keys not claimed by any alias table pass through for display.
fn passthrough_extras(raw: &Map<String, Value>) -> Map<String, Value> {
    raw.iter()
        .filter(|(key, _)| {
            !ALL_ALIASES
                .iter()
                .any(|aliases| aliases.contains(&key.as_str()))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Asset URL repair
// ═══════════════════════════════════════════════════════════

/// Marker separating the storage host from the raw object path.
const OBJECT_PATH_MARKER: &str = "/o/";

const STORAGE_DOMAIN_TYPO: &str = "firebasestoragee.app";
const STORAGE_DOMAIN: &str = "firebasestorage.app";

/// Percent-encode everything in an object path except RFC 3986 unreserved
/// characters. Notably '/' becomes %2F, which the storage host requires
/// inside object names. '%' stays literal: escape sequences a previous
/// pass (or an over-eager producer) already wrote must not be escaped
/// again, otherwise double-encoded input would never converge.
const OBJECT_PATH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'%');

/// Repair a raw asset reference into a retrievable URL.
///
/// References containing the object-path marker are rebuilt as
/// base + re-encoded path + original query: the path is percent-decoded
/// then re-encoded, which repairs both un-encoded and double-encoded
/// upstream producers and makes the pass idempotent. References without
/// the marker pass through unchanged; empty in, empty out.
pub fn repair_asset_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let url = fix_storage_domain_typo(raw);

    let Some(marker) = url.find(OBJECT_PATH_MARKER) else {
        return url;
    };
    let (base, rest) = url.split_at(marker + OBJECT_PATH_MARKER.len());
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let encoded = utf8_percent_encode(&decoded, OBJECT_PATH_ENCODE).to_string();

    match query {
        Some(query) => format!("{base}{encoded}?{query}"),
        None => format!("{base}{encoded}"),
    }
}

/// Correct a known upstream export bug: a doubled 'e' in the storage
/// domain. This is a data-quality patch for a specific producer, not a
/// general rule — delete once upstream data is clean.
pub fn fix_storage_domain_typo(url: &str) -> String {
    if !url.contains("firebasestorage") {
        return url.to_string();
    }
    url.replace(STORAGE_DOMAIN_TYPO, STORAGE_DOMAIN)
        .replace("..app", ".app")
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    // ── Invalid-drop ─────────────────────────────────────────

    #[test]
    fn record_missing_after_asset_is_invalid() {
        let record = raw(json!({
            "id": "r1",
            "hospitalName": "A Clinic",
            "beforeImageUrl": "https://cdn.example.com/b.jpg",
            "likeCount": 120,
        }));
        assert!(normalize_record(&record).is_none());
    }

    #[test]
    fn record_missing_before_asset_is_invalid() {
        let record = raw(json!({
            "id": "r1",
            "afterImageUrl": "https://cdn.example.com/a.jpg",
        }));
        assert!(normalize_record(&record).is_none());
    }

    #[test]
    fn empty_string_asset_is_invalid() {
        let record = raw(json!({
            "id": "r1",
            "before_img": "",
            "after_img": "https://cdn.example.com/a.jpg",
        }));
        assert!(normalize_record(&record).is_none());
    }

    #[test]
    fn invalid_drop_ignores_other_fields() {
        // Fully-populated record, but no assets: still invalid.
        let record = raw(json!({
            "id": "r9",
            "hospitalName": "A Clinic",
            "doctor_name": "Dr. Kim",
            "procedures": "double eyelid",
            "likeCount": 9999,
            "viewCount": 12000,
            "similarity": 0.98,
            "cost": "3,000,000 KRW",
        }));
        assert!(normalize_record(&record).is_none());
    }

    // ── Alias resolution ─────────────────────────────────────

    #[test]
    fn primary_alias_wins_over_legacy() {
        let record = raw(json!({
            "id": "r1",
            "hospitalName": "Primary",
            "hospital_name": "Legacy",
            "beforeImageUrl": "https://cdn.example.com/b.jpg",
            "afterImageUrl": "https://cdn.example.com/a.jpg",
        }));
        let item = normalize_record(&record).unwrap();
        assert_eq!(item.hospital_name, "Primary");
    }

    #[test]
    fn legacy_shape_resolves() {
        let record = raw(json!({
            "id": "r2",
            "hospital_name": "Legacy Clinic",
            "doctor_name": "Dr. Park",
            "procedures": "rhinoplasty",
            "before_img": "https://cdn.example.com/b.jpg",
            "after_img": "https://cdn.example.com/a.jpg",
            "likes": 3,
            "views": 17,
        }));
        let item = normalize_record(&record).unwrap();
        assert_eq!(item.hospital_name, "Legacy Clinic");
        assert_eq!(item.doctor_name, "Dr. Park");
        assert_eq!(item.procedure_label, "rhinoplasty");
        assert_eq!(item.like_count, 3);
        assert_eq!(item.view_count, 17);
    }

    #[test]
    fn classifier_shape_resolves() {
        let record = raw(json!({
            "id": "ai_1",
            "hospital": "B Clinic",
            "label": "epicanthoplasty",
            "before_url": "https://cdn.example.com/b.jpg",
            "after_url": "https://cdn.example.com/a.jpg",
            "similarity": 0.87,
        }));
        let item = normalize_record(&record).unwrap();
        assert!(item.is_synthetic());
        assert_eq!(item.hospital_name, "B Clinic");
        assert_eq!(item.procedure_label, "epicanthoplasty");
        assert_eq!(item.similarity, Some(0.87));
    }

    #[test]
    fn numeric_id_from_navigation_bag_is_stringified() {
        let record = raw(json!({
            "id": 42,
            "beforeUrl": "https://cdn.example.com/b.jpg",
            "afterUrl": "https://cdn.example.com/a.jpg",
            "likeCount": "1247",
        }));
        let item = normalize_record(&record).unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.like_count, 1247);
    }

    // ── Similarity scale ─────────────────────────────────────

    #[test]
    fn percent_similarity_folds_to_unit_interval() {
        let record = raw(json!({
            "id": "r1",
            "similarity": 95,
            "before_img": "https://cdn.example.com/b.jpg",
            "after_img": "https://cdn.example.com/a.jpg",
        }));
        let item = normalize_record(&record).unwrap();
        assert_eq!(item.similarity, Some(0.95));
    }

    #[test]
    fn zero_similarity_means_not_applicable() {
        let record = raw(json!({
            "id": "r1",
            "similarity": 0,
            "before_img": "https://cdn.example.com/b.jpg",
            "after_img": "https://cdn.example.com/a.jpg",
        }));
        let item = normalize_record(&record).unwrap();
        assert_eq!(item.similarity, None);
    }

    #[test]
    fn negative_count_clamps_to_zero() {
        let record = raw(json!({
            "id": "r1",
            "likeCount": -3,
            "before_img": "https://cdn.example.com/b.jpg",
            "after_img": "https://cdn.example.com/a.jpg",
        }));
        assert_eq!(normalize_record(&record).unwrap().like_count, 0);
    }

    // ── Extras passthrough ───────────────────────────────────

    #[test]
    fn unclaimed_fields_pass_through() {
        let record = raw(json!({
            "id": "r1",
            "before_img": "https://cdn.example.com/b.jpg",
            "after_img": "https://cdn.example.com/a.jpg",
            "cost": "2,500,000 KRW",
            "doctor_best_keywords": "natural,detailed",
        }));
        let item = normalize_record(&record).unwrap();
        assert_eq!(item.extras["cost"], "2,500,000 KRW");
        assert_eq!(item.extras["doctor_best_keywords"], "natural,detailed");
        assert!(!item.extras.contains_key("before_img"));
    }

    // ── URL repair ───────────────────────────────────────────

    #[test]
    fn empty_reference_stays_empty() {
        assert_eq!(repair_asset_url(""), "");
    }

    #[test]
    fn plain_url_without_marker_passes_through() {
        let url = "https://cdn.example.com/photos/b.jpg";
        assert_eq!(repair_asset_url(url), url);
    }

    #[test]
    fn unencoded_object_path_gets_encoded() {
        let raw = "https://firebasestorage.googleapis.com/v0/b/app.firebasestorage.app/o/reviews/눈매교정 01.jpg?alt=media";
        let fixed = repair_asset_url(raw);
        assert!(fixed.starts_with(
            "https://firebasestorage.googleapis.com/v0/b/app.firebasestorage.app/o/"
        ));
        assert!(fixed.ends_with("?alt=media"));
        // Path separator and Korean segment both encoded, nothing raw left.
        assert!(fixed.contains("reviews%2F"));
        assert!(!fixed.contains("눈매교정"));
        assert!(!fixed.contains(' '));
    }

    #[test]
    fn repair_is_idempotent() {
        let raw = "https://firebasestorage.googleapis.com/v0/b/app.firebasestorage.app/o/reviews/눈매교정 01.jpg?alt=media&token=abc123";
        let once = repair_asset_url(raw);
        let twice = repair_asset_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn double_encoded_path_collapses() {
        let single = repair_asset_url("https://host/o/reviews/A 1.jpg?alt=media");
        let collapsed = repair_asset_url("https://host/o/reviews%252FA%25201.jpg?alt=media");
        assert_eq!(collapsed, single);
        assert_eq!(single, "https://host/o/reviews%2FA%201.jpg?alt=media");
    }

    #[test]
    fn already_encoded_path_is_a_no_op() {
        let url = "https://host/o/reviews%2FA%201.jpg?alt=media";
        assert_eq!(repair_asset_url(url), url);
    }

    #[test]
    fn query_string_survives_untouched() {
        let raw = "https://host/o/a b.jpg?alt=media&token=x%20y";
        let fixed = repair_asset_url(raw);
        assert!(fixed.ends_with("?alt=media&token=x%20y"));
    }

    // ── Domain typo fixup ────────────────────────────────────

    #[test]
    fn doubled_e_domain_is_corrected() {
        let raw = "https://firebasestorage.googleapis.com/v0/b/app.firebasestoragee.app/o/b.jpg?alt=media";
        let fixed = fix_storage_domain_typo(raw);
        assert!(fixed.contains("app.firebasestorage.app"));
        assert!(!fixed.contains("firebasestoragee"));
    }

    #[test]
    fn doubled_dot_is_corrected() {
        let fixed = fix_storage_domain_typo("https://b/app.firebasestorage..app/o/x");
        assert!(fixed.contains("firebasestorage.app"));
        assert!(!fixed.contains("..app"));
    }

    #[test]
    fn non_storage_urls_are_left_alone() {
        let url = "https://cdn.example.com/storagee..app.jpg";
        assert_eq!(fix_storage_domain_typo(url), url);
    }

    #[test]
    fn typo_fix_applies_before_reconstruction() {
        let raw = "https://firebasestorage.googleapis.com/v0/b/app.firebasestoragee.app/o/reviews/b 1.jpg?alt=media";
        let fixed = repair_asset_url(raw);
        assert!(fixed.contains("app.firebasestorage.app"));
        assert!(fixed.contains("reviews%2Fb%201.jpg"));
    }
}
