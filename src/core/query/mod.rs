//! Query Understanding Module
//!
//! Turns free-text, mixed Chinese/English queries into catalog answers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        QueryEngine                           │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌─────────────────┐   │
//! │  │ AliasRegistry│──▶│  Vocabulary  │──▶│    Tokenizer    │   │
//! │  │ (AliasStore) │   │    Index     │   │ (longest match) │   │
//! │  └──────────────┘   └──────────────┘   └────────┬────────┘   │
//! │                                                 ▼            │
//! │  ┌──────────────┐   ┌──────────────┐   ┌─────────────────┐   │
//! │  │  Suggester   │◀──│   Resolver   │◀──│ Condition Parser│   │
//! │  │ (Levenshtein)│   │(disambiguate)│   │  + Filter       │   │
//! │  └──────────────┘   └──────────────┘   └─────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bazaar_query::core::query::{QueryEngine, QueryConfig, JsonFileAliasStore};
//!
//! let engine = QueryEngine::new(catalog, Box::new(JsonFileAliasStore::new(path)), QueryConfig::default());
//! let conditions = engine.parse_conditions("杜利中型灼烧");
//! // heroes = ["Dooley"], sizes = ["Medium"], tags = ["Burn"]
//! ```

pub mod alias;
pub mod conditions;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod resolver;
pub mod suggest;
pub mod tokenizer;
pub mod vocabulary;

pub use alias::{
    AliasCategory, AliasChange, AliasEntry, AliasRegistry, AliasStore, AliasTable, HostConfig,
    HostConfigAliasStore, InMemoryHostConfig, JsonFileAliasStore, Revision,
};
pub use conditions::{facet_for_prefix, parse_tokens, split_facet, ConditionSet};
pub use config::QueryConfig;
pub use engine::{BuildQuery, LookupOutcome, QueryEngine, SearchReport};
pub use error::{AliasError, AliasResult};
pub use filter::{filter_catalog, SearchResults};
pub use resolver::{resolve_entity, Resolution, DEFAULT_DISAMBIGUATION_LIMIT};
pub use suggest::{distance_threshold, suggest, Suggestion};
pub use tokenizer::{is_cjk, Tokenizer};
pub use vocabulary::{normalize_tier, Facet, VocabEntry, VocabularyIndex, HERO_NICKNAMES, TIER_SYNONYMS};
