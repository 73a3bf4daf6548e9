//! Game Catalog
//!
//! Immutable-per-load collection of every entity the query core can answer
//! about. The catalog is produced by the JSON data loader and is never
//! patched in place: a data update builds a new `Catalog` and swaps it in.
//!
//! ```text
//!  data_dir/
//!   ├── items_db.json          → Vec<Item>
//!   ├── monsters_db.json       → IndexMap<key, Monster>
//!   ├── skills_db.json         → Vec<Skill>
//!   ├── event_detail.json      → Vec<Event>
//!   ├── event_encounters.json  → hero / tier enrichment for events
//!   └── merchants_db.json      → Vec<Merchant>
//! ```

pub mod models;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub use models::{
    clean_tier, split_bilingual, EntityKind, EntityRecord, EntityRef, Event, EventChoice, Item,
    LootTier, Merchant, Monster, MonsterLoot, Skill, SkillText,
};

pub const ITEMS_FILE: &str = "items_db.json";
pub const MONSTERS_FILE: &str = "monsters_db.json";
pub const SKILLS_FILE: &str = "skills_db.json";
pub const EVENTS_FILE: &str = "event_detail.json";
pub const ENCOUNTERS_FILE: &str = "event_encounters.json";
pub const MERCHANTS_FILE: &str = "merchants_db.json";

/// Errors raised while reading a single data file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// In-memory game data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub items: Vec<Item>,
    pub monsters: IndexMap<String, Monster>,
    pub skills: Vec<Skill>,
    pub events: Vec<Event>,
    pub merchants: Vec<Merchant>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every data file found in `dir`.
    ///
    /// Missing files leave their collection empty with a warning; malformed
    /// files do the same with an error. Loading never fails as a whole.
    pub fn load_from_dir(dir: &Path) -> Self {
        let mut catalog = Self {
            items: load_or_default(dir, ITEMS_FILE),
            monsters: load_or_default(dir, MONSTERS_FILE),
            skills: load_or_default(dir, SKILLS_FILE),
            events: load_or_default(dir, EVENTS_FILE),
            merchants: load_or_default(dir, MERCHANTS_FILE),
        };

        let encounters_path = dir.join(ENCOUNTERS_FILE);
        if encounters_path.exists() && !catalog.events.is_empty() {
            match read_json::<Vec<Encounter>>(&encounters_path) {
                Ok(encounters) => {
                    let matched = catalog.enrich_events(&encounters);
                    if matched > 0 {
                        log::info!(
                            "Event enrichment: {}/{} events received hero and tier data",
                            matched,
                            catalog.events.len()
                        );
                    }
                }
                Err(e) => log::warn!("Skipping event enrichment: {e}"),
            }
        }

        log::info!(
            "Catalog loaded from {}: {} monsters, {} items, {} skills, {} events, {} merchants",
            dir.display(),
            catalog.monsters.len(),
            catalog.items.len(),
            catalog.skills.len(),
            catalog.events.len(),
            catalog.merchants.len()
        );

        catalog
    }

    /// Every record across all kinds, in catalog order.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        EntityKind::ALL
            .into_iter()
            .flat_map(move |kind| self.entities_of(kind))
    }

    /// Records of one kind, in catalog order.
    pub fn entities_of(&self, kind: EntityKind) -> Box<dyn Iterator<Item = EntityRef<'_>> + '_> {
        match kind {
            EntityKind::Item => Box::new(self.items.iter().map(EntityRef::Item)),
            EntityKind::Monster => Box::new(
                self.monsters
                    .iter()
                    .map(|(key, m)| EntityRef::Monster(key.as_str(), m)),
            ),
            EntityKind::Skill => Box::new(self.skills.iter().map(EntityRef::Skill)),
            EntityKind::Event => Box::new(self.events.iter().map(EntityRef::Event)),
            EntityKind::Merchant => Box::new(self.merchants.iter().map(EntityRef::Merchant)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
            + self.monsters.len()
            + self.skills.len()
            + self.events.len()
            + self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy hero and starting-tier data from encounter records onto events.
    ///
    /// An event matches an encounter by internal name or localized title,
    /// exactly first, then by unique substring. Returns the number of events
    /// that were enriched.
    pub fn enrich_events(&mut self, encounters: &[Encounter]) -> usize {
        let mut by_name: HashMap<String, (&[String], &str)> = HashMap::new();
        for enc in encounters {
            let internal = enc.internal_name.trim().to_lowercase();
            let title = enc.localization.title.text.trim().to_lowercase();
            let info = (enc.heroes.as_slice(), enc.starting_tier.as_str());
            if !internal.is_empty() {
                by_name.insert(internal.clone(), info);
            }
            if !title.is_empty() && title != internal {
                by_name.insert(title, info);
            }
        }

        let mut matched = 0;
        for event in &mut self.events {
            let name_en = event.name_en.trim().to_lowercase();
            if name_en.is_empty() {
                continue;
            }

            let info = match by_name.get(&name_en) {
                Some(info) => Some(*info),
                None => {
                    let candidates: Vec<_> = by_name
                        .iter()
                        .filter(|(key, _)| key.contains(&name_en))
                        .collect();
                    match candidates.as_slice() {
                        [(_, info)] => Some(**info),
                        [] => None,
                        many => {
                            log::debug!(
                                "Ambiguous encounter match for '{}': {:?}, skipping substring match",
                                name_en,
                                many.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>()
                            );
                            None
                        }
                    }
                }
            };

            if let Some((heroes, tier)) = info {
                event.heroes = heroes.to_vec();
                event.tier = tier.to_string();
                matched += 1;
            }
        }
        matched
    }
}

// ============================================================================
// Encounter records (enrichment source only)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Encounter {
    #[serde(rename = "InternalName", default)]
    pub internal_name: String,
    #[serde(rename = "Localization", default)]
    pub localization: EncounterLocalization,
    #[serde(rename = "Heroes", default)]
    pub heroes: Vec<String>,
    #[serde(rename = "StartingTier", default)]
    pub starting_tier: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncounterLocalization {
    #[serde(rename = "Title", default)]
    pub title: EncounterText,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncounterText {
    #[serde(rename = "Text", default)]
    pub text: String,
}

// ============================================================================
// File helpers
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> CatalogResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_or_default<T: DeserializeOwned + Default>(dir: &Path, file: &str) -> T {
    let path = dir.join(file);
    if !path.exists() {
        log::warn!("Data file not found: {}", path.display());
        return T::default();
    }
    match read_json(&path) {
        Ok(data) => data,
        Err(e) => {
            log::error!("Failed to load {file}: {e}");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, file: &str, value: serde_json::Value) {
        std::fs::write(dir.join(file), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load_from_dir(dir.path());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_and_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            ITEMS_FILE,
            json!([{"name_cn": "短剑", "name_en": "Dagger"}]),
        );
        write(
            dir.path(),
            MONSTERS_FILE,
            json!({"火灵": {"name": "Fire Spirit", "name_zh": "火灵"}}),
        );
        std::fs::write(dir.path().join(SKILLS_FILE), "{ not json").unwrap();

        let catalog = Catalog::load_from_dir(dir.path());
        assert_eq!(catalog.items.len(), 1);
        assert_eq!(catalog.monsters.len(), 1);
        assert!(catalog.skills.is_empty());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_enrich_events_exact_and_unique_substring() {
        let mut catalog = Catalog {
            events: vec![
                Event {
                    name: "奇异蘑菇".to_string(),
                    name_en: "Strange Mushrooms".to_string(),
                    ..Default::default()
                },
                Event {
                    name: "宝箱".to_string(),
                    name_en: "Chest".to_string(),
                    ..Default::default()
                },
                Event {
                    name: "商队".to_string(),
                    name_en: "Caravan".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let encounters: Vec<Encounter> = serde_json::from_value(json!([
            {"InternalName": "Strange Mushrooms", "Heroes": ["Common"], "StartingTier": "Bronze"},
            {"InternalName": "Chest Small", "Heroes": ["Vanessa"], "StartingTier": "Silver"},
            {"InternalName": "Caravan A", "Heroes": ["Mak"], "StartingTier": "Gold"},
            {"InternalName": "Caravan B", "Heroes": ["Mak"], "StartingTier": "Gold"}
        ]))
        .unwrap();

        let matched = catalog.enrich_events(&encounters);
        assert_eq!(matched, 2);
        assert_eq!(catalog.events[0].tier, "Bronze");
        assert_eq!(catalog.events[1].heroes, vec!["Vanessa".to_string()]);
        assert!(catalog.events[2].heroes.is_empty());
    }

    #[test]
    fn test_entities_iterates_all_kinds() {
        let mut catalog = Catalog::new();
        catalog.items.push(Item::default());
        catalog.monsters.insert("m".to_string(), Monster::default());
        catalog.merchants.push(Merchant::default());

        let kinds: Vec<_> = catalog.entities().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Item, EntityKind::Monster, EntityKind::Merchant]
        );
    }
}
