//! Entity record types for the game catalog.
//!
//! Records mirror the JSON data files shipped with the game data dump. The
//! query core only reads the name and facet fields; everything else is kept
//! in the `extra` map and handed to formatters untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Entity Kinds
// ============================================================================

/// The five record families in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Item,
    Monster,
    Skill,
    Event,
    Merchant,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Item,
        EntityKind::Monster,
        EntityKind::Skill,
        EntityKind::Event,
        EntityKind::Merchant,
    ];

    /// Localized label used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Item => "物品",
            EntityKind::Monster => "怪物",
            EntityKind::Skill => "技能",
            EntityKind::Event => "事件",
            EntityKind::Merchant => "商人",
        }
    }

    /// Marker prefixed to suggestion and listing lines.
    pub fn icon(&self) -> &'static str {
        match self {
            EntityKind::Item => "📦",
            EntityKind::Monster => "🐉",
            EntityKind::Skill => "⚡",
            EntityKind::Event => "🎲",
            EntityKind::Merchant => "🏪",
        }
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

/// Treats an explicit JSON `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Skill text attached to an item: either a bare string or a `{cn, en}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillText {
    Plain(String),
    Localized {
        #[serde(default, deserialize_with = "nullable")]
        cn: String,
        #[serde(default, deserialize_with = "nullable")]
        en: String,
    },
}

impl SkillText {
    /// Native text when present, English otherwise.
    pub fn text(&self) -> &str {
        match self {
            SkillText::Plain(s) => s,
            SkillText::Localized { cn, en } => {
                if cn.is_empty() {
                    en
                } else {
                    cn
                }
            }
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A purchasable item.
///
/// Facet fields are bilingual strings such as `"Dooley / 杜利"`; tag fields
/// additionally separate multiple tags with `|`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_cn: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_en: String,
    #[serde(default, deserialize_with = "nullable")]
    pub heroes: String,
    #[serde(default, deserialize_with = "nullable")]
    pub size: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: String,
    #[serde(default, deserialize_with = "nullable")]
    pub hidden_tags: String,
    #[serde(default, deserialize_with = "nullable")]
    pub starting_tier: String,
    #[serde(default, deserialize_with = "nullable")]
    pub skills: Vec<SkillText>,
    #[serde(default, deserialize_with = "nullable")]
    pub skills_passive: Vec<SkillText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A skill a hero can learn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_cn: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_en: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description_cn: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description_en: String,
    #[serde(default, deserialize_with = "nullable")]
    pub heroes: String,
    #[serde(default, deserialize_with = "nullable")]
    pub size: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: String,
    #[serde(default, deserialize_with = "nullable")]
    pub hidden_tags: String,
    #[serde(default, deserialize_with = "nullable")]
    pub starting_tier: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-tier details of a monster skill or carried item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootTier {
    #[serde(default, deserialize_with = "nullable")]
    pub description: Vec<String>,
}

/// A skill or item a monster brings into combat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonsterLoot {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_en: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tier: String,
    #[serde(default, deserialize_with = "nullable")]
    pub current_tier: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tiers: IndexMap<String, Option<LootTier>>,
}

impl MonsterLoot {
    /// Tier label, falling back to the current tier.
    pub fn tier_label(&self) -> &str {
        if self.tier.is_empty() {
            &self.current_tier
        } else {
            &self.tier
        }
    }

    /// Description lines for the current tier, else the first tier that has any.
    pub fn description(&self) -> &[String] {
        let current = self.current_tier.to_lowercase();
        self.tiers
            .get(&current)
            .and_then(|t| t.as_ref())
            .filter(|t| !t.description.is_empty())
            .or_else(|| {
                self.tiers
                    .values()
                    .flatten()
                    .find(|t| !t.description.is_empty())
            })
            .map(|t| t.description.as_slice())
            .unwrap_or(&[])
    }

    /// Stable identity used to collapse duplicate drops.
    pub fn identity(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}

/// A combat encounter. Monsters are keyed by their catalog key, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_zh: String,
    #[serde(default, deserialize_with = "nullable")]
    pub skills: Vec<MonsterLoot>,
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<MonsterLoot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Monster {
    /// Native name, falling back to the catalog key.
    pub fn native_name<'a>(&'a self, key: &'a str) -> &'a str {
        if self.name_zh.is_empty() {
            key
        } else {
            &self.name_zh
        }
    }
}

/// One option offered by an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChoice {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_zh: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description_zh: String,
}

/// A random event. `name` is the native name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_en: String,
    #[serde(default, deserialize_with = "nullable")]
    pub heroes: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tier: String,
    #[serde(default, deserialize_with = "nullable")]
    pub choices: Vec<EventChoice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A merchant or trainer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name_slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tier: String,
    #[serde(default, deserialize_with = "nullable")]
    pub heroes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Merchant {
    pub fn is_merchant(&self) -> bool {
        self.category == "Merchant"
    }

    pub fn is_trainer(&self) -> bool {
        self.category == "Trainer"
    }

    pub fn category_label(&self) -> &str {
        match self.category.as_str() {
            "Merchant" => "商人",
            "Trainer" => "训练师",
            other => other,
        }
    }
}

// ============================================================================
// Record views
// ============================================================================

/// Borrowed view over any catalog record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Item(&'a Item),
    Monster(&'a str, &'a Monster),
    Skill(&'a Skill),
    Event(&'a Event),
    Merchant(&'a Merchant),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Item(_) => EntityKind::Item,
            EntityRef::Monster(..) => EntityKind::Monster,
            EntityRef::Skill(_) => EntityKind::Skill,
            EntityRef::Event(_) => EntityKind::Event,
            EntityRef::Merchant(_) => EntityKind::Merchant,
        }
    }

    /// Native-script name (merchants only have one name).
    pub fn native_name(&self) -> &'a str {
        match *self {
            EntityRef::Item(i) => &i.name_cn,
            EntityRef::Monster(key, m) => m.native_name(key),
            EntityRef::Skill(s) => &s.name_cn,
            EntityRef::Event(e) => &e.name,
            EntityRef::Merchant(m) => &m.name,
        }
    }

    pub fn english_name(&self) -> &'a str {
        match *self {
            EntityRef::Item(i) => &i.name_en,
            EntityRef::Monster(_, m) => &m.name,
            EntityRef::Skill(s) => &s.name_en,
            EntityRef::Event(e) => &e.name_en,
            EntityRef::Merchant(m) => &m.name,
        }
    }

    /// Name shown in disambiguation lists.
    pub fn display_name(&self) -> String {
        match *self {
            EntityRef::Merchant(m) => format!("{} ({}/{})", m.name, m.category_label(), m.tier),
            _ => format!("{}({})", self.native_name(), self.english_name()),
        }
    }

    pub fn to_record(&self) -> EntityRecord {
        match *self {
            EntityRef::Item(i) => EntityRecord::Item(i.clone()),
            EntityRef::Monster(key, m) => EntityRecord::Monster {
                key: key.to_string(),
                monster: m.clone(),
            },
            EntityRef::Skill(s) => EntityRecord::Skill(s.clone()),
            EntityRef::Event(e) => EntityRecord::Event(e.clone()),
            EntityRef::Merchant(m) => EntityRecord::Merchant(m.clone()),
        }
    }
}

/// Owned catalog record, as returned from lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityRecord {
    Item(Item),
    Monster { key: String, monster: Monster },
    Skill(Skill),
    Event(Event),
    Merchant(Merchant),
}

impl EntityRecord {
    pub fn as_ref(&self) -> EntityRef<'_> {
        match self {
            EntityRecord::Item(i) => EntityRef::Item(i),
            EntityRecord::Monster { key, monster } => EntityRef::Monster(key, monster),
            EntityRecord::Skill(s) => EntityRef::Skill(s),
            EntityRecord::Event(e) => EntityRef::Event(e),
            EntityRecord::Merchant(m) => EntityRef::Merchant(m),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.as_ref().kind()
    }

    pub fn display_name(&self) -> String {
        self.as_ref().display_name()
    }
}

// ============================================================================
// Bilingual field helpers
// ============================================================================

/// Reduces a tier field like `"Gold / 黄金"` or `"Gold+ Diamond"` to `"Gold"`.
pub fn clean_tier(raw: &str) -> &str {
    raw.split('/')
        .next()
        .unwrap_or("")
        .trim()
        .split(' ')
        .next()
        .unwrap_or("")
        .trim()
}

/// Splits `"English / 中文"` into `(english, native)`.
pub fn split_bilingual(raw: &str) -> (&str, &str) {
    match raw.split_once('/') {
        Some((en, cn)) => (en.trim(), cn.trim()),
        None => (raw.trim(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_tier() {
        assert_eq!(clean_tier("Gold / 黄金"), "Gold");
        assert_eq!(clean_tier("Bronze+ / 青铜+"), "Bronze+");
        assert_eq!(clean_tier("Silver Gold"), "Silver");
        assert_eq!(clean_tier(""), "");
    }

    #[test]
    fn test_split_bilingual() {
        assert_eq!(split_bilingual("Dooley / 杜利"), ("Dooley", "杜利"));
        assert_eq!(split_bilingual("Medium"), ("Medium", ""));
    }

    #[test]
    fn test_item_tolerates_nulls_and_keeps_payload() {
        let item: Item = serde_json::from_value(json!({
            "name_cn": "短剑",
            "name_en": "Dagger",
            "tags": null,
            "skills": ["造成 5 伤害", {"cn": "暴击", "en": "Crit"}],
            "damage": 5
        }))
        .unwrap();

        assert_eq!(item.name_cn, "短剑");
        assert_eq!(item.tags, "");
        assert_eq!(item.skills[0].text(), "造成 5 伤害");
        assert_eq!(item.skills[1].text(), "暴击");
        assert_eq!(item.extra.get("damage"), Some(&json!(5)));
    }

    #[test]
    fn test_loot_description_falls_back_to_first_filled_tier() {
        let loot: MonsterLoot = serde_json::from_value(json!({
            "name": "火球",
            "current_tier": "Gold",
            "tiers": {
                "bronze": null,
                "silver": {"description": ["造成 10 灼烧"]}
            }
        }))
        .unwrap();

        assert_eq!(loot.description(), ["造成 10 灼烧".to_string()]);
    }

    #[test]
    fn test_display_names() {
        let monster = Monster {
            name: "Fire Spirit".to_string(),
            ..Default::default()
        };
        let view = EntityRef::Monster("火灵", &monster);
        assert_eq!(view.display_name(), "火灵(Fire Spirit)");

        let merchant = Merchant {
            name: "Aila".to_string(),
            category: "Merchant".to_string(),
            tier: "Gold".to_string(),
            ..Default::default()
        };
        assert_eq!(EntityRef::Merchant(&merchant).display_name(), "Aila (商人/Gold)");

        let vendor = Merchant {
            name: "Kina".to_string(),
            category: "Vendor".to_string(),
            tier: "Silver".to_string(),
            ..Default::default()
        };
        assert_eq!(EntityRef::Merchant(&vendor).display_name(), "Kina (Vendor/Silver)");
        assert_eq!(vendor.category_label(), "Vendor");
    }
}
