//! "Did you mean" suggestions for failed lookups.
//!
//! A conservative spelling aid, not a relevance ranking. Distances are
//! counted in characters, so one CJK glyph is one edit.

use std::fmt;

use serde::Serialize;
use strsim::levenshtein;

use crate::core::catalog::{Catalog, EntityKind};

/// Kinds scanned for suggestions. Merchants are looked up by name only.
const SUGGEST_KINDS: [EntityKind; 4] = [
    EntityKind::Item,
    EntityKind::Monster,
    EntityKind::Skill,
    EntityKind::Event,
];

/// A nearby catalog name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: EntityKind,
    pub native: String,
    pub english: String,
    /// 0 when one name contains the other.
    pub distance: usize,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.kind.icon(), self.native, self.english)
    }
}

/// Maximum edit distance accepted for a query of `chars` characters.
pub fn distance_threshold(chars: usize) -> usize {
    (chars / 3).max(1)
}

/// Distance between the folded query and one folded name, if within `threshold`.
fn name_distance(query: &str, query_len: usize, name: &str, threshold: usize) -> Option<usize> {
    if name.contains(query) || query.contains(name) {
        return Some(0);
    }
    if name.chars().count().abs_diff(query_len) > threshold {
        return None;
    }
    Some(levenshtein(query, name)).filter(|d| *d <= threshold)
}

/// Rank catalog names near `query`, closest first, at most `limit` entries.
///
/// Queries shorter than `min_chars` characters get no suggestions.
pub fn suggest(catalog: &Catalog, query: &str, limit: usize, min_chars: usize) -> Vec<Suggestion> {
    let folded = query.trim().to_lowercase();
    let query_len = folded.chars().count();
    if query_len < min_chars.max(1) {
        return Vec::new();
    }
    let threshold = distance_threshold(query_len);

    let mut found: Vec<Suggestion> = SUGGEST_KINDS
        .into_iter()
        .flat_map(|kind| catalog.entities_of(kind))
        .filter_map(|entity| {
            let native = entity.native_name();
            let english = entity.english_name();
            let mut best: Option<usize> = None;
            for name in [native, english] {
                if name.is_empty() {
                    continue;
                }
                let Some(d) = name_distance(&folded, query_len, &name.to_lowercase(), threshold)
                else {
                    continue;
                };
                best = Some(best.map_or(d, |b| b.min(d)));
                if d == 0 {
                    break;
                }
            }
            best.map(|distance| Suggestion {
                kind: entity.kind(),
                native: native.to_string(),
                english: english.to_string(),
                distance,
            })
        })
        .collect();

    found.sort_by_key(|s| s.distance);
    found.truncate(limit);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Item, Skill};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.items.push(Item {
            name_cn: "青铜护符".to_string(),
            name_en: "Bronze".to_string(),
            ..Default::default()
        });
        catalog.items.push(Item {
            name_cn: "短剑".to_string(),
            name_en: "Dagger".to_string(),
            ..Default::default()
        });
        catalog.skills.push(Skill {
            name_cn: "热情如火".to_string(),
            name_en: "Fiery Passion".to_string(),
            ..Default::default()
        });
        catalog
    }

    #[test]
    fn test_threshold() {
        assert_eq!(distance_threshold(2), 1);
        assert_eq!(distance_threshold(5), 1);
        assert_eq!(distance_threshold(9), 3);
    }

    #[test]
    fn test_one_edit_typo() {
        let found = suggest(&catalog(), "brnze", 8, 2);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].english, "Bronze");
        assert_eq!(found[0].distance, 1);
        assert_eq!(found[0].to_string(), "📦 青铜护符(Bronze)");
    }

    #[test]
    fn test_short_query_has_no_suggestions() {
        assert!(suggest(&catalog(), "x", 8, 2).is_empty());
    }

    #[test]
    fn test_containment_ranks_first() {
        let found = suggest(&catalog(), "热情", 8, 2);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].distance, 0);
        assert_eq!(found[0].kind, EntityKind::Skill);
    }

    #[test]
    fn test_limit_applies() {
        let mut catalog = catalog();
        for i in 0..10 {
            catalog.items.push(Item {
                name_cn: format!("短剑{i}"),
                ..Default::default()
            });
        }
        assert_eq!(suggest(&catalog, "短剑", 3, 2).len(), 3);
    }
}
