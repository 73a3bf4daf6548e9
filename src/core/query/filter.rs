//! Catalog filtering.
//!
//! Facet values within one list are conjunctive for items and skills
//! (every tag must match), except sizes, where any listed size matches.
//! Events and merchants match heroes any-of because they list several.
//! The free keyword is a case-insensitive substring test against the
//! record's names, facet fields and descriptions.

use serde::Serialize;

use super::conditions::ConditionSet;
use crate::core::catalog::{
    clean_tier, Catalog, EntityKind, EntityRef, Event, Item, Merchant, Monster, Skill,
};

fn contains_folded(haystack: &str, needle_folded: &str) -> bool {
    haystack.to_lowercase().contains(needle_folded)
}

fn all_in(haystack: &str, needles: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().all(|n| haystack.contains(&n.to_lowercase()))
}

fn any_hero(heroes: &[String], wanted: &[String]) -> bool {
    wanted.iter().any(|w| {
        let w = w.to_lowercase();
        heroes.iter().any(|h| h.to_lowercase() == w)
    })
}

// ============================================================================
// Faceted filters
// ============================================================================

/// Items matching every facet and the keyword.
pub fn filter_items<'a>(catalog: &'a Catalog, conditions: &ConditionSet) -> Vec<&'a Item> {
    let keyword = conditions.keyword.to_lowercase();
    catalog
        .items
        .iter()
        .filter(|item| {
            conditions.tags.is_empty()
                || all_in(&format!("{} {}", item.tags, item.hidden_tags), &conditions.tags)
        })
        .filter(|item| {
            conditions.tiers.is_empty()
                || conditions
                    .tiers
                    .iter()
                    .any(|t| t.as_str() == clean_tier(&item.starting_tier))
        })
        .filter(|item| conditions.heroes.is_empty() || all_in(&item.heroes, &conditions.heroes))
        .filter(|item| {
            let size = item.size.to_lowercase();
            conditions.sizes.is_empty()
                || conditions
                    .sizes
                    .iter()
                    .any(|s| size.contains(&s.to_lowercase()))
        })
        .filter(|item| {
            keyword.is_empty() || {
                let searchable = [
                    item.name_cn.as_str(),
                    item.name_en.as_str(),
                    item.tags.as_str(),
                    item.hidden_tags.as_str(),
                    item.heroes.as_str(),
                    item.size.as_str(),
                ]
                .join(" ");
                contains_folded(&searchable, &keyword)
            }
        })
        .collect()
}

/// Skills matching the hero facet and the keyword. Skills carry no tier,
/// tag or size data worth filtering on.
pub fn filter_skills<'a>(catalog: &'a Catalog, conditions: &ConditionSet) -> Vec<&'a Skill> {
    let keyword = conditions.keyword.to_lowercase();
    catalog
        .skills
        .iter()
        .filter(|s| conditions.heroes.is_empty() || all_in(&s.heroes, &conditions.heroes))
        .filter(|s| keyword.is_empty() || skill_matches(s, &keyword))
        .collect()
}

// ============================================================================
// Keyword searches
// ============================================================================

pub fn search_items<'a>(catalog: &'a Catalog, keyword: &str) -> Vec<&'a Item> {
    let kw = keyword.trim().to_lowercase();
    catalog
        .items
        .iter()
        .filter(|i| {
            [&i.name_cn, &i.name_en, &i.tags, &i.hidden_tags, &i.heroes]
                .iter()
                .any(|f| contains_folded(f, &kw))
        })
        .collect()
}

fn skill_matches(skill: &Skill, kw: &str) -> bool {
    [
        &skill.name_cn,
        &skill.name_en,
        &skill.description_cn,
        &skill.description_en,
        &skill.heroes,
    ]
    .iter()
    .any(|f| contains_folded(f, kw))
}

pub fn search_skills<'a>(catalog: &'a Catalog, keyword: &str) -> Vec<&'a Skill> {
    let kw = keyword.trim().to_lowercase();
    catalog.skills.iter().filter(|s| skill_matches(s, &kw)).collect()
}

/// Monsters whose key or names match, or that carry a matching skill or item.
pub fn search_monsters<'a>(catalog: &'a Catalog, keyword: &str) -> Vec<(&'a str, &'a Monster)> {
    let kw = keyword.trim().to_lowercase();
    catalog
        .monsters
        .iter()
        .filter(|(key, m)| {
            contains_folded(key, &kw)
                || contains_folded(&m.name, &kw)
                || contains_folded(&m.name_zh, &kw)
                || m.skills
                    .iter()
                    .chain(&m.items)
                    .any(|l| contains_folded(&l.name, &kw) || contains_folded(&l.name_en, &kw))
        })
        .map(|(key, m)| (key.as_str(), m))
        .collect()
}

/// Events matching the keyword (names or any choice text), restricted to
/// events listing at least one of `heroes` when given.
pub fn search_events<'a>(catalog: &'a Catalog, keyword: &str, heroes: &[String]) -> Vec<&'a Event> {
    let kw = keyword.trim().to_lowercase();
    catalog
        .events
        .iter()
        .filter(|e| heroes.is_empty() || any_hero(&e.heroes, heroes))
        .filter(|e| {
            kw.is_empty()
                || contains_folded(&e.name, &kw)
                || contains_folded(&e.name_en, &kw)
                || e.choices.iter().any(|c| {
                    [&c.name, &c.name_zh, &c.description_zh, &c.description]
                        .iter()
                        .any(|f| contains_folded(f, &kw))
                })
        })
        .collect()
}

pub fn search_merchants<'a>(catalog: &'a Catalog, keyword: &str) -> Vec<&'a Merchant> {
    let kw = keyword.trim().to_lowercase();
    catalog
        .merchants
        .iter()
        .filter(|m| {
            [&m.name, &m.description, &m.category, &m.tier]
                .iter()
                .any(|f| contains_folded(f, &kw))
                || m.heroes.iter().any(|h| contains_folded(h, &kw))
        })
        .collect()
}

// ============================================================================
// Per-kind and aggregate filtering
// ============================================================================

/// Records of one kind satisfying `conditions`.
///
/// Monsters carry no facets, so any facet condition excludes them.
pub fn filter_catalog<'a>(
    catalog: &'a Catalog,
    kind: EntityKind,
    conditions: &ConditionSet,
) -> Vec<EntityRef<'a>> {
    match kind {
        EntityKind::Item => filter_items(catalog, conditions)
            .into_iter()
            .map(EntityRef::Item)
            .collect(),
        EntityKind::Skill => filter_skills(catalog, conditions)
            .into_iter()
            .map(EntityRef::Skill)
            .collect(),
        EntityKind::Monster if conditions.has_filters() => Vec::new(),
        EntityKind::Monster => search_monsters(catalog, &conditions.keyword)
            .into_iter()
            .map(|(key, m)| EntityRef::Monster(key, m))
            .collect(),
        EntityKind::Event => search_events(catalog, &conditions.keyword, &conditions.heroes)
            .into_iter()
            .map(EntityRef::Event)
            .collect(),
        EntityKind::Merchant => search_merchants(catalog, &conditions.keyword)
            .into_iter()
            .filter(|m| conditions.heroes.is_empty() || any_hero(&m.heroes, &conditions.heroes))
            .filter(|m| conditions.tiers.is_empty() || conditions.tiers.contains(&m.tier))
            .map(EntityRef::Merchant)
            .collect(),
    }
}

/// Results of a multi-kind search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults<'a> {
    pub items: Vec<&'a Item>,
    pub skills: Vec<&'a Skill>,
    pub monsters: Vec<(&'a str, &'a Monster)>,
    pub events: Vec<&'a Event>,
}

impl SearchResults<'_> {
    pub fn total(&self) -> usize {
        self.items.len() + self.skills.len() + self.monsters.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Search every kind a query can sensibly target.
///
/// Skills are skipped when a tier, tag or size facet is present. Monsters
/// only answer a pure keyword query. Events need a keyword or a hero.
pub fn search<'a>(catalog: &'a Catalog, conditions: &ConditionSet) -> SearchResults<'a> {
    let skill_facets = !conditions.tiers.is_empty()
        || !conditions.tags.is_empty()
        || !conditions.sizes.is_empty();

    SearchResults {
        items: filter_items(catalog, conditions),
        skills: if skill_facets {
            Vec::new()
        } else {
            filter_skills(catalog, conditions)
        },
        monsters: if !conditions.keyword.is_empty() && !conditions.has_filters() {
            search_monsters(catalog, &conditions.keyword)
        } else {
            Vec::new()
        },
        events: if !conditions.keyword.is_empty() || !conditions.heroes.is_empty() {
            search_events(catalog, &conditions.keyword, &conditions.heroes)
        } else {
            Vec::new()
        },
    }
}
