//! Retrieval tuning.

use serde::Deserialize;

use coverbind_core::evidence::DROPPED_EXCERPT_CHARS;

/// Knobs for [`EvidenceRetriever`](crate::EvidenceRetriever).
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrieverConfig {
    /// Excerpts shorter than this (after trimming, in characters) are dropped as `no_content`.
    pub min_excerpt_chars: usize,
    /// Characters kept on each side of an amount match.
    pub context_chars: usize,
    /// Characters of a dropped excerpt kept in the debug trail.
    pub dropped_excerpt_chars: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            min_excerpt_chars: 10,
            context_chars: 10,
            dropped_excerpt_chars: DROPPED_EXCERPT_CHARS,
        }
    }
}

impl RetrieverConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
