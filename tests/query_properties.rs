//! Property tests for tokenization, aliases and suggestions.

use std::sync::Arc;

use proptest::prelude::*;

use bazaar_query::core::catalog::{Catalog, Item, Skill};
use bazaar_query::core::query::{
    distance_threshold, AliasCategory, HostConfigAliasStore, InMemoryHostConfig, QueryConfig,
    QueryEngine,
};

const NAMES: &[&str] = &["火焰喷射器", "杜利的扳手", "短剑", "热情如火", "灼烧之心"];

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.items = vec![
        Item {
            name_cn: "火焰喷射器".to_string(),
            name_en: "Flamethrower".to_string(),
            heroes: "Dooley / 杜利".to_string(),
            size: "Medium / 中型".to_string(),
            tags: "Burn / 灼烧".to_string(),
            ..Default::default()
        },
        Item {
            name_cn: "杜利的扳手".to_string(),
            name_en: "Dooley's Wrench".to_string(),
            heroes: "Dooley / 杜利".to_string(),
            ..Default::default()
        },
        Item {
            name_cn: "短剑".to_string(),
            name_en: "Dagger".to_string(),
            tags: "Weapon / 武器".to_string(),
            ..Default::default()
        },
        Item {
            name_cn: "灼烧之心".to_string(),
            name_en: "Heart of Burn".to_string(),
            ..Default::default()
        },
    ];
    catalog.skills.push(Skill {
        name_cn: "热情如火".to_string(),
        name_en: "Fiery Passion".to_string(),
        ..Default::default()
    });
    catalog
}

fn engine() -> QueryEngine {
    let store = HostConfigAliasStore::new(Arc::new(InMemoryHostConfig::new()));
    QueryEngine::new(catalog(), Box::new(store), QueryConfig::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_known_names_are_never_split(idx in 0..NAMES.len()) {
        let name = NAMES[idx];
        prop_assert_eq!(engine().tokenize(name), vec![name.to_string()]);
    }

    #[test]
    fn test_tokenization_preserves_text(query in "[杜利中型灼烧武器短剑火心]{1,12}") {
        let tokens = engine().tokenize(&query);
        prop_assert_eq!(tokens.concat(), query);
    }

    #[test]
    fn test_alias_round_trip(alias in "[a-z\u{4e00}-\u{4e50}]{1,6}", target in "[A-Za-z]{1,10}") {
        let engine = engine();
        engine.add_alias(AliasCategory::Item, &alias, &target).unwrap();
        prop_assert_eq!(engine.resolve_alias(&alias), target.clone());
        prop_assert_eq!(engine.resolve_alias(&alias.to_uppercase()), target);
    }

    #[test]
    fn test_add_then_delete_is_identity(alias in "[\u{4e00}-\u{4e50}]{2,5}", value in "[A-Za-z]{1,8}") {
        let engine = engine();
        let before = engine.vocabulary();
        engine.add_alias(AliasCategory::Tag, &alias, &value).unwrap();
        engine.remove_alias(AliasCategory::Tag, &alias).unwrap();
        prop_assert_eq!(&*engine.vocabulary(), &*before);
    }

    #[test]
    fn test_suggestions_respect_threshold(query in "[a-zA-Z ]{2,16}") {
        let engine = engine();
        let threshold = distance_threshold(query.trim().chars().count());
        for suggestion in engine.suggest(&query, 8) {
            prop_assert!(suggestion.distance <= threshold);
        }
    }
}
