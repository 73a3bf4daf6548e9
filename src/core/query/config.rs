//! Query Configuration
//!
//! Tunables for tokenization, disambiguation and suggestion output.

use serde::{Deserialize, Serialize};

/// Limits applied by the query pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum number of "did you mean" suggestions
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Queries shorter than this (in characters) get no suggestions
    #[serde(default = "default_min_suggest_chars")]
    pub min_suggest_chars: usize,

    /// Maximum candidates listed when a lookup is ambiguous
    #[serde(default = "default_disambiguation_limit")]
    pub disambiguation_limit: usize,

    /// CJK tokens shorter than this (in characters) are never decomposed
    #[serde(default = "default_min_decompose_chars")]
    pub min_decompose_chars: usize,

    /// Rows per page in search result listings
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: default_suggestion_limit(),
            min_suggest_chars: default_min_suggest_chars(),
            disambiguation_limit: default_disambiguation_limit(),
            min_decompose_chars: default_min_decompose_chars(),
            page_size: default_page_size(),
        }
    }
}

// Default value helpers for serde
fn default_suggestion_limit() -> usize { 8 }
fn default_min_suggest_chars() -> usize { 2 }
fn default_disambiguation_limit() -> usize { 15 }
fn default_min_decompose_chars() -> usize { 4 }
fn default_page_size() -> usize { 30 }
