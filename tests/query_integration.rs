//! Integration tests for the query engine against on-disk data.
//!
//! Each test builds a throwaway data directory with `tempfile`, loads it
//! through `Catalog::load_from_dir` and drives the public engine and
//! command APIs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use bazaar_query::core::catalog::{Catalog, EntityKind, EntityRecord};
use bazaar_query::core::commands::{CommandDispatcher, Reply};
use bazaar_query::core::query::{
    AliasCategory, AliasError, JsonFileAliasStore, LookupOutcome, QueryConfig, QueryEngine,
};

fn write_json(dir: &Path, file: &str, value: serde_json::Value) {
    std::fs::write(dir.join(file), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "items_db.json",
        json!([
            {
                "id": "i1",
                "name_cn": "火焰喷射器",
                "name_en": "Flamethrower",
                "heroes": "Dooley / 杜利",
                "size": "Medium / 中型",
                "tags": "Burn / 灼烧 | Weapon / 武器",
                "starting_tier": "Gold / 黄金",
                "skills": ["造成灼烧"]
            },
            {
                "id": "i2",
                "name_cn": "短剑",
                "name_en": "Dagger",
                "heroes": "Vanessa / 瓦妮莎",
                "size": "Small / 小型",
                "tags": "Weapon / 武器",
                "starting_tier": "Bronze / 青铜"
            }
        ]),
    );
    write_json(
        dir.path(),
        "monsters_db.json",
        json!({
            "火灵": {
                "name": "Fire Spirit",
                "name_zh": "火灵",
                "items": [{"id": "l1", "name": "余烬", "name_en": "Ember", "current_tier": "Silver"}]
            }
        }),
    );
    write_json(
        dir.path(),
        "skills_db.json",
        json!([{ "name_cn": "热情如火", "name_en": "Fiery Passion", "heroes": "Dooley / 杜利" }]),
    );
    write_json(
        dir.path(),
        "event_detail.json",
        json!([{ "name": "奇异蘑菇", "name_en": "Strange Mushrooms", "choices": [] }]),
    );
    write_json(
        dir.path(),
        "event_encounters.json",
        json!([{
            "InternalName": "Strange Mushrooms",
            "Heroes": ["Dooley"],
            "StartingTier": "Bronze"
        }]),
    );
    dir
}

fn engine_at(data: &Path, alias_file: &Path) -> QueryEngine {
    let catalog = Catalog::load_from_dir(data);
    QueryEngine::new(
        catalog,
        Box::new(JsonFileAliasStore::new(alias_file)),
        QueryConfig::default(),
    )
}

#[test]
fn test_catalog_loads_and_enriches_events() {
    let data = data_dir();
    let catalog = Catalog::load_from_dir(data.path());
    assert_eq!(catalog.items.len(), 2);
    assert_eq!(catalog.monsters.len(), 1);
    assert!(catalog.merchants.is_empty());
    assert_eq!(catalog.events[0].heroes, vec!["Dooley".to_string()]);
    assert_eq!(catalog.events[0].tier, "Bronze");
}

#[test]
fn test_concatenated_conditions_are_recognized() {
    let data = data_dir();
    let engine = engine_at(data.path(), &data.path().join("aliases.json"));

    let conditions = engine.parse_conditions("杜利中型灼烧");
    assert_eq!(conditions.heroes, vec!["Dooley".to_string()]);
    assert_eq!(conditions.sizes, vec!["Medium".to_string()]);
    assert_eq!(conditions.tags, vec!["Burn".to_string()]);
    assert!(conditions.keyword.is_empty());

    let report = engine.search("杜利中型灼烧");
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].name_en, "Flamethrower");
    assert!(report.skills.is_empty());
}

#[test]
fn test_prefixed_conditions() {
    let data = data_dir();
    let engine = engine_at(data.path(), &data.path().join("aliases.json"));
    let conditions = engine.parse_conditions("tier:Gold tag:Weapon");
    assert_eq!(conditions.tiers, vec!["Gold".to_string()]);
    assert_eq!(conditions.tags, vec!["Weapon".to_string()]);
    assert_eq!(conditions.keyword, "");

    let items = engine.filter_catalog(EntityKind::Item, &conditions);
    assert_eq!(items.len(), 1);
    assert!(matches!(&items[0], EntityRecord::Item(i) if i.name_cn == "火焰喷射器"));
}

#[test]
fn test_aliases_persist_across_engines() {
    let data = data_dir();
    let alias_file = data.path().join("aliases.json");
    {
        let engine = engine_at(data.path(), &alias_file);
        engine.add_alias(AliasCategory::Item, "喷火", "火焰喷射器").unwrap();
        engine.add_alias(AliasCategory::Hero, "机器人", "Dooley").unwrap();
    }
    assert!(alias_file.exists());

    let engine = engine_at(data.path(), &alias_file);
    assert_eq!(engine.alias_count(), 2);
    assert!(matches!(
        engine.lookup(EntityKind::Item, "喷火"),
        LookupOutcome::Found(EntityRecord::Item(_))
    ));
    assert_eq!(engine.parse_conditions("机器人").heroes, vec!["Dooley".to_string()]);
}

#[test]
fn test_external_alias_edit_is_picked_up() {
    let data = data_dir();
    let alias_file = data.path().join("aliases.json");
    let engine = engine_at(data.path(), &alias_file);
    assert!(engine.vocabulary().lookup("爆炸").is_none());

    std::thread::sleep(Duration::from_millis(20));
    write_json(data.path(), "aliases.json", json!({ "tag": { "爆炸": "Burn" } }));

    assert_eq!(engine.parse_conditions("爆炸").tags, vec!["Burn".to_string()]);
    assert_eq!(engine.alias_count(), 1);
}

#[test]
fn test_add_then_remove_restores_vocabulary() {
    let data = data_dir();
    let engine = engine_at(data.path(), &data.path().join("aliases.json"));
    let before = engine.vocabulary();

    engine.add_alias(AliasCategory::Size, "大号", "Large").unwrap();
    assert_ne!(*engine.vocabulary(), *before);
    engine.remove_alias(AliasCategory::Size, "大号").unwrap();

    assert_eq!(*engine.vocabulary(), *before);
}

#[test]
fn test_persist_failure_keeps_alias_in_memory() {
    let data = data_dir();
    let blocker = data.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let engine = engine_at(data.path(), &blocker.join("aliases.json"));

    let err = engine.add_alias(AliasCategory::Tag, "爆炸", "Burn").unwrap_err();
    assert!(matches!(err, AliasError::Persist(_)));
    assert_eq!(engine.vocabulary().lookup("爆炸").unwrap().value, "Burn");
}

#[test]
fn test_missing_data_dir_yields_empty_catalog() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nowhere");
    let engine = engine_at(&missing, &tmp.path().join("aliases.json"));
    assert!(engine.catalog().is_empty());
    match engine.lookup(EntityKind::Item, "短剑") {
        LookupOutcome::NotFound(msg) => assert!(msg.starts_with("未找到物品「短剑」")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_monster_carried_item_via_command() {
    let data = data_dir();
    let engine = engine_at(data.path(), &data.path().join("aliases.json"));
    let dispatcher = CommandDispatcher::new(Arc::new(engine));

    let reply = dispatcher.handle_line("/tbzitem 余烬").unwrap();
    let text = reply.text().unwrap();
    assert!(text.contains("🐉 所属怪物: 火灵(Fire Spirit)"));
}

#[test]
fn test_search_command_lists_sections() {
    let data = data_dir();
    let engine = engine_at(data.path(), &data.path().join("aliases.json"));
    let dispatcher = CommandDispatcher::new(Arc::new(engine));

    match dispatcher.handle_line("/tbzsearch 武器").unwrap() {
        Reply::Sections(sections) => {
            assert!(sections[0].starts_with("🔍 搜索「武器」的结果 (共2条)"));
            assert!(sections.iter().any(|s| s.contains("火焰喷射器(Flamethrower)")));
        }
        other => panic!("unexpected {other:?}"),
    }
}
