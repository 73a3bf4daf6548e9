//! Vocabulary Index
//!
//! Maps every known surface form (hero, tier, tag, size, user alias) to a
//! `(facet, canonical value)` pair and keeps the set of full entity names
//! used to keep names atomic during tokenization.
//!
//! The index is never patched. [`VocabularyIndex::rebuild`] derives a new
//! one from a catalog and an alias table, and the caller swaps it in.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::alias::{AliasCategory, AliasTable};
use crate::core::catalog::{Catalog, EntityRef};

/// Tier synonyms accepted anywhere a tier is expected. Keys are lowercase.
pub const TIER_SYNONYMS: &[(&str, &str)] = &[
    ("bronze", "Bronze"),
    ("silver", "Silver"),
    ("gold", "Gold"),
    ("diamond", "Diamond"),
    ("legendary", "Legendary"),
    ("铜", "Bronze"),
    ("青铜", "Bronze"),
    ("银", "Silver"),
    ("白银", "Silver"),
    ("金", "Gold"),
    ("黄金", "Gold"),
    ("钻", "Diamond"),
    ("钻石", "Diamond"),
    ("传奇", "Legendary"),
];

/// Built-in hero nicknames. Keys are matched case-insensitively.
pub const HERO_NICKNAMES: &[(&str, &str)] = &[
    ("杜利", "Dooley"),
    ("鸡煲", "Dooley"),
    ("机宝", "Dooley"),
    ("朱尔斯", "Jules"),
    ("厨子", "Jules"),
    ("大厨", "Jules"),
    ("厨师", "Jules"),
    ("马克", "Mak"),
    ("皮格马利翁", "Pygmalien"),
    ("猪猪", "Pygmalien"),
    ("猪", "Pygmalien"),
    ("猪哥", "Pygmalien"),
    ("斯黛拉", "Stelle"),
    ("黑妹", "Stelle"),
    ("瓦妮莎", "Vanessa"),
    ("海盗", "Vanessa"),
    ("海盗姐", "Vanessa"),
];

/// Catalog-derived surface forms shorter than this are ignored.
const MIN_SURFACE_CHARS: usize = 2;

/// Normalize a user-typed tier through the synonym table.
///
/// Unknown values are capitalized (`"gold+"` → `"Gold+"`).
pub fn normalize_tier(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    if let Some((_, canonical)) = TIER_SYNONYMS.iter().find(|(k, _)| *k == lower) {
        return canonical.to_string();
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Types
// ============================================================================

/// A named query dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Hero,
    Tier,
    Tag,
    Size,
}

impl Facet {
    /// Localized label used in condition summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Facet::Hero => "英雄",
            Facet::Tier => "品质",
            Facet::Tag => "标签",
            Facet::Size => "尺寸",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facet::Hero => "hero",
            Facet::Tier => "tier",
            Facet::Tag => "tag",
            Facet::Size => "size",
        };
        f.write_str(name)
    }
}

/// One surface form and what it means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    /// Lowercased surface form.
    pub surface: String,
    pub facet: Facet,
    pub value: String,
}

/// Immutable snapshot of the query vocabulary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyIndex {
    entries: HashMap<String, VocabEntry>,
    /// Surface forms, longest first, for greedy segmentation.
    sorted: Vec<String>,
    entity_names: HashSet<String>,
}

impl VocabularyIndex {
    /// An index that knows nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fresh index from catalog facets, tier synonyms and aliases.
    ///
    /// Registration order decides overrides: catalog facets first, then the
    /// tier table, then user aliases, so an alias always wins.
    pub fn rebuild(catalog: &Catalog, aliases: &AliasTable) -> Self {
        let mut index = Self::default();

        for item in &catalog.items {
            for part in item.heroes.split('/') {
                let part = part.trim();
                let part = part.split(" | ").next().unwrap_or(part).trim();
                index.register_facet(part, Facet::Hero, primary_value(&item.heroes));
            }
            for part in item.size.split('/') {
                index.register_facet(part.trim(), Facet::Size, primary_value(&item.size));
            }
            for field in [&item.tags, &item.hidden_tags] {
                for group in field.split('|') {
                    let canonical = primary_value(group);
                    for part in group.split('/') {
                        index.register_facet(part.trim(), Facet::Tag, canonical);
                    }
                }
            }
        }

        for (surface, canonical) in TIER_SYNONYMS {
            if surface.chars().count() >= MIN_SURFACE_CHARS {
                index.register(surface, Facet::Tier, canonical);
            }
        }

        for category in AliasCategory::ALL {
            let Some(facet) = category.facet() else {
                continue;
            };
            if let Some(entries) = aliases.category(category) {
                for (alias, target) in entries {
                    index.register(alias, facet, target);
                }
            }
        }

        index.sorted = index.entries.keys().cloned().collect();
        index.sorted.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        index.entity_names = catalog
            .entities()
            .flat_map(|e| {
                let key = match e {
                    EntityRef::Monster(key, _) => Some(key),
                    _ => None,
                };
                [Some(e.native_name()), Some(e.english_name()), key]
            })
            .flatten()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();

        log::debug!(
            "Vocabulary rebuilt: {} surface forms, {} entity names",
            index.entries.len(),
            index.entity_names.len()
        );
        index
    }

    fn register_facet(&mut self, surface: &str, facet: Facet, canonical: &str) {
        if surface.chars().count() >= MIN_SURFACE_CHARS && !canonical.is_empty() {
            self.register(surface, facet, canonical);
        }
    }

    fn register(&mut self, surface: &str, facet: Facet, value: &str) {
        let key = surface.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        self.entries.insert(
            key.clone(),
            VocabEntry {
                surface: key,
                facet,
                value: value.trim().to_string(),
            },
        );
    }

    /// Case-insensitive lookup of a whole surface form.
    pub fn lookup(&self, surface: &str) -> Option<&VocabEntry> {
        self.entries.get(&surface.trim().to_lowercase())
    }

    /// All surface forms, longest first.
    pub fn surface_forms(&self) -> &[String] {
        &self.sorted
    }

    /// True when `text` is a full entity name, or a fragment of at least two
    /// characters of one.
    pub fn is_entity_name(&self, text: &str) -> bool {
        let folded = text.trim().to_lowercase();
        if folded.is_empty() {
            return false;
        }
        if self.entity_names.contains(&folded) {
            return true;
        }
        folded.chars().count() >= MIN_SURFACE_CHARS
            && self.entity_names.iter().any(|name| name.contains(&folded))
    }

    /// True when `text` exactly equals a known entity name.
    pub fn is_exact_entity_name(&self, text: &str) -> bool {
        self.entity_names.contains(&text.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical value of a bilingual facet field: its first segment.
fn primary_value(raw: &str) -> &str {
    let first = raw.split('/').next().unwrap_or("").trim();
    first.split(" | ").next().unwrap_or(first).trim()
}
