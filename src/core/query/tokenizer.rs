//! Mixed-script tokenizer.
//!
//! Chinese queries arrive without spaces ("杜利中型灼烧"), so whitespace
//! splitting alone is not enough. CJK tokens are segmented greedily against
//! the vocabulary, longest surface form first:
//!
//! ```text
//!   "杜利中型灼烧"
//!     prefix match  "杜利"   → rest "中型灼烧"
//!     prefix match  "中型"   → rest "灼烧"
//!     prefix match  "灼烧"   → done
//!   = ["杜利", "中型", "灼烧"]
//! ```
//!
//! Entity names always win over segmentation, so a four-character monster
//! name is never chopped into unrelated vocabulary hits.

use super::vocabulary::VocabularyIndex;

/// Characters separating a facet prefix from its value.
pub const FACET_SEPARATORS: [char; 2] = [':', '：'];

/// True for characters in the CJK Unified Ideographs block.
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Vocabulary-guided tokenizer over one index snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a> {
    vocab: &'a VocabularyIndex,
    min_decompose_chars: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(vocab: &'a VocabularyIndex, min_decompose_chars: usize) -> Self {
        Self {
            vocab,
            min_decompose_chars,
        }
    }

    /// Split a raw query into tokens.
    pub fn tokenize(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        if self.vocab.is_entity_name(query) {
            return vec![query.to_string()];
        }

        let mut tokens = Vec::new();
        for token in query.split_whitespace() {
            if token.contains(FACET_SEPARATORS) || self.vocab.is_entity_name(token) {
                tokens.push(token.to_string());
            } else if self.should_decompose(token) {
                tokens.extend(self.decompose(token));
            } else {
                tokens.push(token.to_string());
            }
        }
        tokens
    }

    fn should_decompose(&self, token: &str) -> bool {
        token.chars().any(is_cjk) && token.chars().count() >= self.min_decompose_chars
    }

    /// Greedy longest-match segmentation. Every iteration consumes at least
    /// one character, so this always terminates.
    fn decompose(&self, token: &str) -> Vec<String> {
        let lowered = token.to_lowercase();
        let surfaces = self.vocab.surface_forms();
        let mut remaining = lowered.as_str();
        let mut out = Vec::new();

        while !remaining.is_empty() {
            if let Some(term) = surfaces.iter().find(|t| remaining.starts_with(t.as_str())) {
                out.push(term.clone());
                remaining = &remaining[term.len()..];
                continue;
            }

            let embedded = surfaces.iter().find_map(|t| {
                remaining
                    .find(t.as_str())
                    .filter(|idx| *idx > 0)
                    .map(|idx| (idx, t))
            });
            match embedded {
                Some((idx, term)) => {
                    out.push(remaining[..idx].to_string());
                    out.push(term.clone());
                    remaining = &remaining[idx + term.len()..];
                }
                None => {
                    out.push(remaining.to_string());
                    break;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Catalog, Item, Monster};
    use crate::core::query::alias::{AliasCategory, AliasTable};

    fn vocab() -> VocabularyIndex {
        let mut catalog = Catalog::new();
        catalog.items.push(Item {
            name_cn: "火焰喷射器".to_string(),
            name_en: "Flamethrower".to_string(),
            heroes: "Dooley / 杜利".to_string(),
            size: "Medium / 中型".to_string(),
            tags: "Burn / 灼烧".to_string(),
            ..Default::default()
        });
        catalog.monsters.insert(
            "深渊巨口兽".to_string(),
            Monster {
                name: "Abyssal Maw".to_string(),
                ..Default::default()
            },
        );
        let mut aliases = AliasTable::new();
        aliases.insert(AliasCategory::Tag, "武器", "Weapon");
        VocabularyIndex::rebuild(&catalog, &aliases)
    }

    #[test]
    fn test_compound_query_is_segmented() {
        let vocab = vocab();
        let tokens = Tokenizer::new(&vocab, 4).tokenize("杜利中型灼烧");
        assert_eq!(tokens, vec!["杜利", "中型", "灼烧"]);
    }

    #[test]
    fn test_entity_name_stays_whole() {
        let vocab = vocab();
        let tokenizer = Tokenizer::new(&vocab, 4);
        assert_eq!(tokenizer.tokenize("深渊巨口兽"), vec!["深渊巨口兽"]);
        assert_eq!(tokenizer.tokenize("  Abyssal Maw "), vec!["Abyssal Maw"]);
    }

    #[test]
    fn test_facet_tokens_pass_through() {
        let vocab = vocab();
        let tokens = Tokenizer::new(&vocab, 4).tokenize("tag:Weapon 英雄：杜利 杜利武器");
        assert_eq!(tokens, vec!["tag:Weapon", "英雄：杜利", "杜利", "武器"]);
    }

    #[test]
    fn test_unmatched_leading_fragment() {
        let vocab = vocab();
        let tokens = Tokenizer::new(&vocab, 4).tokenize("超级灼烧");
        assert_eq!(tokens, vec!["超级", "灼烧"]);
    }

    #[test]
    fn test_no_vocabulary_hit_emits_rest() {
        let vocab = vocab();
        let tokens = Tokenizer::new(&vocab, 4).tokenize("杜利什么东西");
        assert_eq!(tokens, vec!["杜利", "什么东西"]);
    }

    #[test]
    fn test_empty_query() {
        let vocab = VocabularyIndex::empty();
        assert!(Tokenizer::new(&vocab, 4).tokenize("   ").is_empty());
    }
}
