//! User Alias Store
//!
//! Users maintain alternate names ("猪猪" → "Pygmalien", "船锚" → "Anchor")
//! per category. Aliases live in durable storage behind the [`AliasStore`]
//! trait and are reloaded whenever the storage changes underneath us.
//!
//! ```text
//!   AliasRegistry ──load/save──▶ dyn AliasStore
//!        │                        ├── JsonFileAliasStore   (mtime change marker)
//!        │                        └── HostConfigAliasStore (snapshot equality)
//!        ▼
//!    AliasTable  ──▶ VocabularyIndex::rebuild
//! ```
//!
//! Mutations are last-write-wins per `(category, alias)`, with aliases
//! compared case-insensitively. Targets are not checked against the catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{AliasError, AliasResult};
use super::vocabulary::Facet;

// ============================================================================
// Categories
// ============================================================================

/// Namespace an alias belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasCategory {
    Hero,
    Item,
    Monster,
    Skill,
    Tag,
    Tier,
    Size,
}

impl AliasCategory {
    pub const ALL: [AliasCategory; 7] = [
        AliasCategory::Hero,
        AliasCategory::Item,
        AliasCategory::Monster,
        AliasCategory::Skill,
        AliasCategory::Tag,
        AliasCategory::Tier,
        AliasCategory::Size,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AliasCategory::Hero => "hero",
            AliasCategory::Item => "item",
            AliasCategory::Monster => "monster",
            AliasCategory::Skill => "skill",
            AliasCategory::Tag => "tag",
            AliasCategory::Tier => "tier",
            AliasCategory::Size => "size",
        }
    }

    /// Key under which a host configuration object stores this category.
    pub fn config_key(&self) -> &'static str {
        match self {
            AliasCategory::Hero => "hero_aliases",
            AliasCategory::Item => "item_aliases",
            AliasCategory::Monster => "monster_aliases",
            AliasCategory::Skill => "skill_aliases",
            AliasCategory::Tag => "tag_aliases",
            AliasCategory::Tier => "tier_aliases",
            AliasCategory::Size => "size_aliases",
        }
    }

    /// Facet fed into the vocabulary; entity-name categories have none.
    pub fn facet(&self) -> Option<Facet> {
        match self {
            AliasCategory::Hero => Some(Facet::Hero),
            AliasCategory::Tag => Some(Facet::Tag),
            AliasCategory::Tier => Some(Facet::Tier),
            AliasCategory::Size => Some(Facet::Size),
            AliasCategory::Item | AliasCategory::Monster | AliasCategory::Skill => None,
        }
    }

    /// Comma-separated list of every category name, for help text.
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AliasCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AliasCategory {
    type Err = AliasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or(AliasError::UnknownCategory(lower))
    }
}

/// A single `(category, alias, target)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub category: AliasCategory,
    pub alias: String,
    pub target: String,
}

// ============================================================================
// Alias Table
// ============================================================================

/// Snapshot of every alias, grouped by category.
///
/// Serialized as `{"hero": {"猪猪": "Pygmalien"}, "item": {}, ...}`.
/// Unknown categories in stored data are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAliasTable", into = "RawAliasTable")]
pub struct AliasTable {
    categories: BTreeMap<AliasCategory, BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct RawAliasTable(BTreeMap<String, BTreeMap<String, String>>);

impl From<RawAliasTable> for AliasTable {
    fn from(raw: RawAliasTable) -> Self {
        let mut table = AliasTable::default();
        for (name, entries) in raw.0 {
            match name.parse::<AliasCategory>() {
                Ok(category) => {
                    table.categories.insert(category, entries);
                }
                Err(_) => log::warn!("Ignoring unknown alias category '{name}'"),
            }
        }
        table
    }
}

impl From<AliasTable> for RawAliasTable {
    fn from(table: AliasTable) -> Self {
        let mut raw = BTreeMap::new();
        for category in AliasCategory::ALL {
            let entries = table.categories.get(&category).cloned().unwrap_or_default();
            raw.insert(category.as_str().to_string(), entries);
        }
        RawAliasTable(raw)
    }
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aliases of one category, keyed by alias as typed.
    pub fn category(&self, category: AliasCategory) -> Option<&BTreeMap<String, String>> {
        self.categories.get(&category)
    }

    /// Insert or replace an alias. An existing alias that differs only by
    /// case is replaced. Returns the previous target.
    pub fn insert(&mut self, category: AliasCategory, alias: &str, target: &str) -> Option<String> {
        let previous = self.remove(category, alias);
        self.categories
            .entry(category)
            .or_default()
            .insert(alias.to_string(), target.to_string());
        previous
    }

    /// Remove an alias, matched case-insensitively. Returns its target.
    pub fn remove(&mut self, category: AliasCategory, alias: &str) -> Option<String> {
        let entries = self.categories.get_mut(&category)?;
        let folded = alias.to_lowercase();
        let key = entries.keys().find(|k| k.to_lowercase() == folded)?.clone();
        entries.remove(&key)
    }

    /// Target of an alias whose case-folded form equals `folded`.
    pub fn lookup(&self, category: AliasCategory, folded: &str) -> Option<&str> {
        self.categories
            .get(&category)?
            .iter()
            .find(|(alias, _)| alias.to_lowercase() == folded)
            .map(|(_, target)| target.as_str())
    }

    /// All entries, optionally restricted to one category, in category then alias order.
    pub fn entries(&self, category: Option<AliasCategory>) -> Vec<AliasEntry> {
        self.categories
            .iter()
            .filter(|(c, _)| category.map_or(true, |wanted| **c == wanted))
            .flat_map(|(c, entries)| {
                entries.iter().map(move |(alias, target)| AliasEntry {
                    category: *c,
                    alias: alias.clone(),
                    target: target.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Cheap marker used to detect out-of-band edits to alias storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// The store cannot tell; callers compare loaded snapshots instead.
    Untracked,
    /// Backing file does not exist.
    Missing,
    /// Backing file last-modified time.
    ModifiedAt(SystemTime),
}

/// Durable home of the alias table.
pub trait AliasStore: Send + Sync {
    /// Read the full table. A store with no data yet returns an empty table.
    fn load(&self) -> AliasResult<AliasTable>;

    /// Durably replace the stored table.
    fn save(&self, table: &AliasTable) -> AliasResult<()>;

    /// Current change marker. Must be cheap in the no-change case.
    fn revision(&self) -> AliasResult<Revision>;
}

/// Aliases kept in a standalone JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileAliasStore {
    path: PathBuf,
}

impl JsonFileAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AliasStore for JsonFileAliasStore {
    fn load(&self) -> AliasResult<AliasTable> {
        if !self.path.exists() {
            return Ok(AliasTable::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, table: &AliasTable) -> AliasResult<()> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(table)?;
            let tmp = self.path.with_extension("json.tmp");
            std::fs::write(&tmp, json)?;
            std::fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| AliasError::Persist(format!("{}: {e}", self.path.display())))
    }

    fn revision(&self) -> AliasResult<Revision> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Revision::ModifiedAt(meta.modified()?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Revision::Missing),
            Err(e) => Err(e.into()),
        }
    }
}

/// Key/value configuration object owned by the host application.
pub trait HostConfig: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    /// Flush the configuration to the host's durable storage.
    fn save(&self) -> Result<(), String>;
}

/// Host configuration held purely in memory.
#[derive(Debug, Default)]
pub struct InMemoryHostConfig {
    values: RwLock<Map<String, Value>>,
}

impl InMemoryHostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }
}

impl HostConfig for InMemoryHostConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn save(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Aliases kept inside a host configuration object, one key per category.
///
/// Each value is either a JSON object or a JSON-encoded string of one.
pub struct HostConfigAliasStore<C: HostConfig> {
    config: Arc<C>,
}

impl<C: HostConfig> HostConfigAliasStore<C> {
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }
}

/// Decode one category value from host configuration.
fn parse_alias_value(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|t| (k.clone(), t.to_string())))
            .collect(),
        Value::String(s) if !s.trim().is_empty() => {
            match serde_json::from_str::<BTreeMap<String, String>>(s.trim()) {
                Ok(map) => map,
                Err(e) => {
                    let preview: String = s.chars().take(100).collect();
                    log::warn!("Alias config JSON parse failed ({e}): {preview}");
                    BTreeMap::new()
                }
            }
        }
        _ => BTreeMap::new(),
    }
}

impl<C: HostConfig> AliasStore for HostConfigAliasStore<C> {
    fn load(&self) -> AliasResult<AliasTable> {
        let mut table = AliasTable::default();
        for category in AliasCategory::ALL {
            let entries = self
                .config
                .get(category.config_key())
                .map(|v| parse_alias_value(&v))
                .unwrap_or_default();
            table.categories.insert(category, entries);
        }
        Ok(table)
    }

    fn save(&self, table: &AliasTable) -> AliasResult<()> {
        for category in AliasCategory::ALL {
            let entries = table.category(category).cloned().unwrap_or_default();
            let encoded = serde_json::to_string_pretty(&entries)?;
            self.config.set(category.config_key(), Value::String(encoded));
        }
        self.config.save().map_err(AliasError::Persist)
    }

    fn revision(&self) -> AliasResult<Revision> {
        Ok(Revision::Untracked)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Result of an `add`: the target the alias pointed at before, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasChange {
    pub entry: AliasEntry,
    pub previous: Option<String>,
}

/// Alias table plus the store revision it was loaded from or saved at.
///
/// Both live under one lock so a reload and a save can never interleave.
#[derive(Debug, Default)]
struct AliasState {
    table: AliasTable,
    revision: Option<Revision>,
}

/// In-memory alias table kept in step with its store.
pub struct AliasRegistry {
    store: Box<dyn AliasStore>,
    state: RwLock<AliasState>,
}

impl AliasRegistry {
    /// Load the initial table. A load failure starts from an empty table.
    pub fn new(store: Box<dyn AliasStore>) -> Self {
        let revision = store.revision().ok();
        let table = load_logged(store.as_ref());
        Self {
            store,
            state: RwLock::new(AliasState { table, revision }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AliasState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AliasState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the current table.
    pub fn snapshot(&self) -> AliasTable {
        self.read().table.clone()
    }

    /// Reload from the store if it changed since the last load or save.
    ///
    /// Store I/O happens outside the lock. Returns `true` when the
    /// in-memory table was replaced.
    pub fn refresh(&self) -> bool {
        let current = match self.store.revision() {
            Ok(rev) => rev,
            Err(e) => {
                log::debug!("Alias store revision unavailable: {e}");
                return false;
            }
        };

        if current == Revision::Untracked {
            let loaded = load_logged(self.store.as_ref());
            let mut state = self.write();
            if state.table == loaded {
                return false;
            }
            state.table = loaded;
            return true;
        }

        if self.read().revision == Some(current) {
            return false;
        }
        let loaded = load_logged(self.store.as_ref());
        let mut state = self.write();
        if state.revision == Some(current) {
            // Another caller reloaded or saved in the meantime.
            return false;
        }
        state.table = loaded;
        state.revision = Some(current);
        true
    }

    /// Resolve a whole query against item, monster and skill aliases, then hero aliases.
    pub fn resolve(&self, query: &str) -> Option<String> {
        let folded = query.trim().to_lowercase();
        let state = self.read();
        [
            AliasCategory::Item,
            AliasCategory::Monster,
            AliasCategory::Skill,
            AliasCategory::Hero,
        ]
        .into_iter()
        .find_map(|c| state.table.lookup(c, &folded))
        .map(str::to_string)
    }

    /// Target of one alias in one category, matched case-insensitively.
    pub fn lookup(&self, category: AliasCategory, alias: &str) -> Option<String> {
        self.read()
            .table
            .lookup(category, &alias.trim().to_lowercase())
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list(&self, category: Option<AliasCategory>) -> Vec<AliasEntry> {
        self.read().table.entries(category)
    }

    /// Add or replace an alias and persist the table.
    ///
    /// On a persist failure the in-memory table keeps the change and
    /// `AliasError::Persist` is returned.
    pub fn add(&self, category: AliasCategory, alias: &str, target: &str) -> AliasResult<AliasChange> {
        let alias = alias.trim();
        let target = target.trim();
        if alias.is_empty() || target.is_empty() {
            return Err(AliasError::EmptyAlias);
        }

        let previous = self.mutate(|table| table.insert(category, alias, target))?;
        Ok(AliasChange {
            entry: AliasEntry {
                category,
                alias: alias.to_string(),
                target: target.to_string(),
            },
            previous,
        })
    }

    /// Delete an alias and persist the table. Returns the removed target.
    pub fn remove(&self, category: AliasCategory, alias: &str) -> AliasResult<String> {
        let alias = alias.trim();
        let not_found = || AliasError::AliasNotFound {
            category: category.to_string(),
            alias: alias.to_string(),
        };
        if self.read().table.lookup(category, &alias.to_lowercase()).is_none() {
            return Err(not_found());
        }
        self.mutate(|table| table.remove(category, alias))?
            .ok_or_else(not_found)
    }

    fn mutate<T>(&self, change: impl FnOnce(&mut AliasTable) -> T) -> AliasResult<T> {
        let mut state = self.write();
        let out = change(&mut state.table);
        match self.store.save(&state.table) {
            Ok(()) => {
                // Our own write must not look like an external edit.
                state.revision = self.store.revision().ok();
                Ok(out)
            }
            Err(e) => {
                log::error!("Failed to save aliases: {e}");
                Err(match e {
                    AliasError::Persist(_) => e,
                    other => AliasError::Persist(other.to_string()),
                })
            }
        }
    }
}

fn load_logged(store: &dyn AliasStore) -> AliasTable {
    match store.load() {
        Ok(table) => table,
        Err(e) => {
            log::error!("Failed to load aliases: {e}");
            AliasTable::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parse() {
        assert_eq!("Hero".parse::<AliasCategory>().unwrap(), AliasCategory::Hero);
        assert!(matches!(
            "weapon".parse::<AliasCategory>(),
            Err(AliasError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_table_insert_is_case_insensitive() {
        let mut table = AliasTable::new();
        assert_eq!(table.insert(AliasCategory::Item, "ABC", "Anchor"), None);
        assert_eq!(
            table.insert(AliasCategory::Item, "abc", "Anvil"),
            Some("Anchor".to_string())
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(AliasCategory::Item, "abc"), Some("Anvil"));
    }

    #[test]
    fn test_table_serde_drops_unknown_categories() {
        let table: AliasTable = serde_json::from_value(json!({
            "hero": {"猪猪": "Pygmalien"},
            "weapon": {"x": "y"}
        }))
        .unwrap();
        assert_eq!(table.len(), 1);

        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["hero"]["猪猪"], "Pygmalien");
        assert_eq!(value["size"], json!({}));
    }

    #[test]
    fn test_parse_alias_value_accepts_object_and_string() {
        let from_obj = parse_alias_value(&json!({"a": "b", "n": 1}));
        assert_eq!(from_obj.len(), 1);

        let from_str = parse_alias_value(&json!("{\"猪猪\": \"Pygmalien\"}"));
        assert_eq!(from_str.get("猪猪").map(String::as_str), Some("Pygmalien"));

        assert!(parse_alias_value(&json!("not json")).is_empty());
        assert!(parse_alias_value(&json!(42)).is_empty());
    }

    #[test]
    fn test_registry_resolve_order() {
        let config = Arc::new(InMemoryHostConfig::new());
        let registry = AliasRegistry::new(Box::new(HostConfigAliasStore::new(config)));
        registry.add(AliasCategory::Hero, "大厨", "Jules").unwrap();
        registry.add(AliasCategory::Item, "大厨", "Chef's Knife").unwrap();

        assert_eq!(registry.resolve("  大厨 "), Some("Chef's Knife".to_string()));
        assert_eq!(registry.resolve("nothing"), None);
    }

    #[test]
    fn test_registry_rejects_empty_alias() {
        let registry = AliasRegistry::new(Box::new(HostConfigAliasStore::new(Arc::new(
            InMemoryHostConfig::new(),
        ))));
        assert!(matches!(
            registry.add(AliasCategory::Tag, "  ", "Burn"),
            Err(AliasError::EmptyAlias)
        ));
    }

    #[test]
    fn test_host_config_refresh_detects_external_edit() {
        let config = Arc::new(InMemoryHostConfig::new());
        let registry = AliasRegistry::new(Box::new(HostConfigAliasStore::new(config.clone())));
        assert!(!registry.refresh());

        config.set("tag_aliases", json!({"烧": "Burn"}));
        assert!(registry.refresh());
        assert_eq!(registry.list(Some(AliasCategory::Tag)).len(), 1);
        assert!(!registry.refresh());
    }

    #[test]
    fn test_remove_missing_alias() {
        let registry = AliasRegistry::new(Box::new(HostConfigAliasStore::new(Arc::new(
            InMemoryHostConfig::new(),
        ))));
        assert!(matches!(
            registry.remove(AliasCategory::Hero, "ghost"),
            Err(AliasError::AliasNotFound { .. })
        ));
    }

    /// Store with a slow save and a revision that moves on every call.
    #[derive(Default)]
    struct SlowStore {
        table: std::sync::Mutex<AliasTable>,
        ticks: std::sync::atomic::AtomicU64,
    }

    impl AliasStore for SlowStore {
        fn load(&self) -> AliasResult<AliasTable> {
            Ok(self.table.lock().unwrap().clone())
        }

        fn save(&self, table: &AliasTable) -> AliasResult<()> {
            std::thread::sleep(std::time::Duration::from_millis(300));
            *self.table.lock().unwrap() = table.clone();
            Ok(())
        }

        fn revision(&self) -> AliasResult<Revision> {
            let tick = self.ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Revision::ModifiedAt(
                SystemTime::UNIX_EPOCH + std::time::Duration::from_nanos(tick + 1),
            ))
        }
    }

    #[test]
    fn test_refresh_during_slow_save_does_not_deadlock() {
        use std::sync::mpsc;
        use std::time::Duration;

        let registry = Arc::new(AliasRegistry::new(Box::new(SlowStore::default())));
        let (tx, rx) = mpsc::channel();

        let writer = {
            let registry = registry.clone();
            let tx = tx.clone();
            std::thread::spawn(move || {
                registry.add(AliasCategory::Tag, "爆炸", "Burn").unwrap();
                tx.send("add").unwrap();
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        let reader = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry.refresh();
                tx.send("refresh").unwrap();
            })
        };

        let mut done = Vec::new();
        for _ in 0..2 {
            done.push(
                rx.recv_timeout(Duration::from_secs(3))
                    .expect("add and refresh must both finish"),
            );
        }
        writer.join().unwrap();
        reader.join().unwrap();

        done.sort_unstable();
        assert_eq!(done, ["add", "refresh"]);
        assert_eq!(
            registry.lookup(AliasCategory::Tag, "爆炸"),
            Some("Burn".to_string())
        );
    }
}
