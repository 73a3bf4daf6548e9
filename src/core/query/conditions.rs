//! Condition Parser
//!
//! Turns tokenizer output into a [`ConditionSet`]: explicit `facet:value`
//! tokens first, then whole-token vocabulary hits, and whatever is left
//! becomes free keyword text.

use serde::Serialize;

use super::tokenizer::FACET_SEPARATORS;
use super::vocabulary::{normalize_tier, Facet, VocabularyIndex};

/// Structured form of one search query. Built once, consumed once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionSet {
    pub keyword: String,
    pub tags: Vec<String>,
    pub tiers: Vec<String>,
    pub heroes: Vec<String>,
    pub sizes: Vec<String>,
}

impl ConditionSet {
    /// True when any facet (not the keyword) constrains the search.
    pub fn has_filters(&self) -> bool {
        !(self.tags.is_empty()
            && self.tiers.is_empty()
            && self.heroes.is_empty()
            && self.sizes.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty() && !self.has_filters()
    }

    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Hero => &self.heroes,
            Facet::Tier => &self.tiers,
            Facet::Tag => &self.tags,
            Facet::Size => &self.sizes,
        }
    }

    fn push(&mut self, facet: Facet, value: String) {
        let list = match facet {
            Facet::Hero => &mut self.heroes,
            Facet::Tier => &mut self.tiers,
            Facet::Tag => &mut self.tags,
            Facet::Size => &mut self.sizes,
        };
        list.push(value);
    }

    /// Human-readable breakdown, e.g. `英雄:Dooley | 尺寸:Medium | 关键词:剑`.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = [Facet::Hero, Facet::Tier, Facet::Tag, Facet::Size]
            .into_iter()
            .filter(|f| !self.values(*f).is_empty())
            .map(|f| format!("{}:{}", f.label(), self.values(f).join(",")))
            .collect();
        if !self.keyword.is_empty() {
            parts.push(format!("关键词:{}", self.keyword));
        }
        parts.join(" | ")
    }
}

/// Facet named by an explicit prefix, English or Chinese.
pub fn facet_for_prefix(prefix: &str) -> Option<Facet> {
    match prefix.trim().to_lowercase().as_str() {
        "tag" | "标签" => Some(Facet::Tag),
        "tier" | "品质" => Some(Facet::Tier),
        "hero" | "英雄" => Some(Facet::Hero),
        "size" | "尺寸" => Some(Facet::Size),
        _ => None,
    }
}

/// Split `prefix:value` at the first separator.
pub fn split_facet(token: &str) -> Option<(&str, &str)> {
    let idx = token.find(FACET_SEPARATORS)?;
    let sep_len = token[idx..].chars().next().map_or(1, char::len_utf8);
    Some((&token[..idx], &token[idx + sep_len..]))
}

/// Build a condition set from already tokenized input.
///
/// Unknown prefixes such as `foo:bar` are not errors; the token becomes
/// keyword text.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S], vocab: &VocabularyIndex) -> ConditionSet {
    let mut conditions = ConditionSet::default();
    let mut keywords: Vec<&str> = Vec::new();

    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() {
            continue;
        }

        if let Some((prefix, value)) = split_facet(token) {
            match facet_for_prefix(prefix) {
                Some(facet) => {
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    let value = match facet {
                        Facet::Tier => normalize_tier(value),
                        _ => value.to_string(),
                    };
                    conditions.push(facet, value);
                }
                None => keywords.push(token),
            }
        } else if let Some(entry) = vocab.lookup(token) {
            conditions.push(entry.facet, entry.value.clone());
        } else {
            keywords.push(token);
        }
    }

    conditions.keyword = keywords.join(" ");
    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Catalog, Item};
    use crate::core::query::alias::AliasTable;
    use rstest::rstest;

    fn vocab() -> VocabularyIndex {
        let mut catalog = Catalog::new();
        catalog.items.push(Item {
            heroes: "Mak / 马克".to_string(),
            tags: "Weapon / 武器".to_string(),
            ..Default::default()
        });
        VocabularyIndex::rebuild(&catalog, &AliasTable::new())
    }

    #[rstest]
    #[case("tag", Some(Facet::Tag))]
    #[case("TIER", Some(Facet::Tier))]
    #[case("英雄", Some(Facet::Hero))]
    #[case("尺寸", Some(Facet::Size))]
    #[case("foo", None)]
    fn test_facet_for_prefix(#[case] prefix: &str, #[case] expected: Option<Facet>) {
        assert_eq!(facet_for_prefix(prefix), expected);
    }

    #[test]
    fn test_split_facet_full_width() {
        assert_eq!(split_facet("品质：黄金"), Some(("品质", "黄金")));
        assert_eq!(split_facet("a:b:c"), Some(("a", "b:c")));
        assert_eq!(split_facet("plain"), None);
    }

    #[test]
    fn test_prefixed_tokens() {
        let conditions = parse_tokens(&["tier:Gold", "tag:Weapon"], &VocabularyIndex::empty());
        assert_eq!(conditions.tiers, vec!["Gold"]);
        assert_eq!(conditions.tags, vec!["Weapon"]);
        assert_eq!(conditions.keyword, "");
    }

    #[test]
    fn test_tier_prefix_normalized() {
        let conditions = parse_tokens(&["品质:青铜", "tier:diamond"], &VocabularyIndex::empty());
        assert_eq!(conditions.tiers, vec!["Bronze", "Diamond"]);
    }

    #[test]
    fn test_vocabulary_and_keyword() {
        let conditions = parse_tokens(&["马克", "黄金", "武器", "匕首"], &vocab());
        assert_eq!(conditions.heroes, vec!["Mak"]);
        assert_eq!(conditions.tiers, vec!["Gold"]);
        assert_eq!(conditions.tags, vec!["Weapon"]);
        assert_eq!(conditions.keyword, "匕首");
    }

    #[test]
    fn test_unknown_prefix_degrades_to_keyword() {
        let conditions = parse_tokens(&["foo:bar", "tag:"], &VocabularyIndex::empty());
        assert_eq!(conditions.keyword, "foo:bar");
        assert!(!conditions.has_filters());
    }

    #[test]
    fn test_summary() {
        let conditions = ConditionSet {
            keyword: "剑".to_string(),
            heroes: vec!["Dooley".to_string()],
            sizes: vec!["Medium".to_string()],
            ..Default::default()
        };
        assert_eq!(conditions.summary(), "英雄:Dooley | 尺寸:Medium | 关键词:剑");
    }
}
