use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sort key for store-backed feeds. Mirrors the filter tabs of the
/// recommendation screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Similarity,
    Likes,
    Views,
}

#[derive(Debug, Error)]
#[error("Invalid sort key: {0}")]
pub struct ParseSortKeyError(String);

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Likes => "likes",
            Self::Views => "views",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "similarity" => Ok(Self::Similarity),
            "likes" => Ok(Self::Likes),
            "views" => Ok(Self::Views),
            other => Err(ParseSortKeyError(other.to_string())),
        }
    }
}
