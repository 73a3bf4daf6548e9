//! Query Engine
//!
//! Owns the catalog, the alias registry and the current vocabulary
//! snapshot, and runs the full pipeline:
//!
//! ```text
//!   raw text ─▶ resolve_alias ─▶ tokenize ─▶ parse_conditions
//!                    │                              │
//!                    ▼                              ▼
//!            exact / keyword lookup          faceted search
//!                    │
//!                    ▼
//!             resolve_entity ──miss──▶ suggest
//! ```
//!
//! Every entry point first checks the alias store for out-of-band edits.
//! Vocabulary rebuilds replace the whole `Arc`, so a query that already
//! holds a snapshot keeps a consistent view.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use super::alias::{AliasCategory, AliasChange, AliasEntry, AliasRegistry, AliasStore};
use super::conditions::{parse_tokens, ConditionSet};
use super::config::QueryConfig;
use super::error::{AliasError, AliasResult};
use super::filter;
use super::resolver::{resolve_entity, Resolution};
use super::suggest::{suggest, Suggestion};
use super::tokenizer::Tokenizer;
use super::vocabulary::{Facet, VocabularyIndex, HERO_NICKNAMES};
use crate::core::catalog::{
    Catalog, EntityKind, EntityRecord, EntityRef, Event, Item, Monster, MonsterLoot, Skill,
};

/// Result of a single-entity lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(EntityRecord),
    /// An item found only in a monster's loadout.
    Carried {
        item: MonsterLoot,
        /// Display name of the monster carrying it.
        owner: String,
    },
    Ambiguous(String),
    NotFound(String),
}

/// Owned results of a faceted search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub conditions: ConditionSet,
    pub monsters: Vec<(String, Monster)>,
    pub items: Vec<Item>,
    pub skills: Vec<Skill>,
    pub events: Vec<Event>,
}

impl SearchReport {
    pub fn total(&self) -> usize {
        self.monsters.len() + self.items.len() + self.skills.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Search term for an external build database plus a readable breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildQuery {
    pub search_term: String,
    pub display: String,
}

pub struct QueryEngine {
    catalog: RwLock<Arc<Catalog>>,
    aliases: AliasRegistry,
    vocab: RwLock<Arc<VocabularyIndex>>,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(catalog: Catalog, store: Box<dyn AliasStore>, config: QueryConfig) -> Self {
        let aliases = AliasRegistry::new(store);
        let vocab = VocabularyIndex::rebuild(&catalog, &aliases.snapshot());
        log::info!(
            "Query engine ready: {} records, {} aliases, {} vocabulary entries",
            catalog.len(),
            aliases.len(),
            vocab.len()
        );
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            aliases,
            vocab: RwLock::new(Arc::new(vocab)),
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current vocabulary snapshot.
    pub fn vocabulary(&self) -> Arc<VocabularyIndex> {
        self.vocab
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Swap in freshly loaded game data.
    pub fn replace_catalog(&self, catalog: Catalog) {
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        self.rebuild_vocabulary();
    }

    fn rebuild_vocabulary(&self) {
        let catalog = self.catalog();
        let index = VocabularyIndex::rebuild(&catalog, &self.aliases.snapshot());
        *self.vocab.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(index);
    }

    /// Pick up alias edits made outside this process.
    fn ensure_fresh(&self) {
        if self.aliases.refresh() {
            log::info!("Alias store changed, rebuilding vocabulary");
            self.rebuild_vocabulary();
        }
    }

    // ========================================================================
    // Pipeline stages
    // ========================================================================

    /// Whole-string alias resolution; the trimmed input when no alias matches.
    pub fn resolve_alias(&self, text: &str) -> String {
        self.ensure_fresh();
        self.aliases
            .resolve(text)
            .unwrap_or_else(|| text.trim().to_string())
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.ensure_fresh();
        let vocab = self.vocabulary();
        Tokenizer::new(&vocab, self.config.min_decompose_chars).tokenize(text)
    }

    pub fn parse_conditions(&self, text: &str) -> ConditionSet {
        self.ensure_fresh();
        let vocab = self.vocabulary();
        let tokens = Tokenizer::new(&vocab, self.config.min_decompose_chars).tokenize(text);
        parse_tokens(&tokens, &vocab)
    }

    /// Records of one kind satisfying `conditions`.
    pub fn filter_catalog(&self, kind: EntityKind, conditions: &ConditionSet) -> Vec<EntityRecord> {
        let catalog = self.catalog();
        filter::filter_catalog(&catalog, kind, conditions)
            .iter()
            .map(EntityRef::to_record)
            .collect()
    }

    /// Faceted search across items, skills, monsters and events.
    pub fn search(&self, query: &str) -> SearchReport {
        let conditions = self.parse_conditions(query);
        let catalog = self.catalog();
        let results = filter::search(&catalog, &conditions);
        log::debug!(
            "Search '{}' parsed as [{}]: {} results",
            query,
            conditions.summary(),
            results.total()
        );
        SearchReport {
            query: query.trim().to_string(),
            monsters: results
                .monsters
                .iter()
                .map(|(k, m)| (k.to_string(), (*m).clone()))
                .collect(),
            items: results.items.into_iter().cloned().collect(),
            skills: results.skills.into_iter().cloned().collect(),
            events: results.events.into_iter().cloned().collect(),
            conditions,
        }
    }

    pub fn suggest(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        suggest(&self.catalog(), query, limit, self.config.min_suggest_chars)
    }

    /// Not-found message, with "did you mean" lines when there are any.
    pub fn not_found_message(&self, query: &str, kind: EntityKind) -> String {
        let mut msg = format!("未找到{}「{}」。", kind.label(), query);
        if kind == EntityKind::Merchant {
            return msg;
        }
        let suggestions = self.suggest(query, self.config.suggestion_limit);
        if suggestions.is_empty() {
            msg.push_str("\n💡 请使用 /tbzsearch 搜索。");
        } else {
            msg.push_str("\n\n🔍 你可能在找:\n");
            let lines: Vec<String> = suggestions.iter().map(|s| format!("  {s}")).collect();
            msg.push_str(&lines.join("\n"));
            msg.push_str("\n\n💡 请使用精确名称重新查询，或使用 /tbzsearch 搜索。");
        }
        msg
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Resolve a query to one record of `kind`.
    ///
    /// Aliases are applied first, then an exact name match, then keyword
    /// search with disambiguation. Items also fall back to monster loadouts.
    pub fn lookup(&self, kind: EntityKind, query: &str) -> LookupOutcome {
        let resolved = self.resolve_alias(query);
        if resolved.is_empty() {
            return LookupOutcome::NotFound(self.not_found_message(query.trim(), kind));
        }
        let folded = resolved.to_lowercase();
        let catalog = self.catalog();

        if let Some(entity) = catalog.entities_of(kind).find(|e| is_exact(e, &folded)) {
            return LookupOutcome::Found(entity.to_record());
        }

        let results = keyword_search(&catalog, kind, &resolved);
        let resolution = resolve_entity(
            results,
            &resolved,
            EntityRef::display_name,
            String::new,
            self.config.disambiguation_limit,
        );

        match resolution {
            Resolution::Found(entity) => LookupOutcome::Found(entity.to_record()),
            Resolution::Ambiguous { message, .. } => LookupOutcome::Ambiguous(message),
            Resolution::NotFound(_) => {
                if kind == EntityKind::Item {
                    if let Some((item, owner)) = find_carried_item(&catalog, &folded) {
                        return LookupOutcome::Carried { item, owner };
                    }
                }
                LookupOutcome::NotFound(self.not_found_message(&resolved, kind))
            }
        }
    }

    // ========================================================================
    // Aliases
    // ========================================================================

    pub fn list_aliases(&self, category: Option<AliasCategory>) -> Vec<AliasEntry> {
        self.ensure_fresh();
        self.aliases.list(category)
    }

    /// Add or replace an alias, persist it and rebuild the vocabulary.
    ///
    /// A persist failure still leaves the alias active in memory.
    pub fn add_alias(&self, category: AliasCategory, alias: &str, target: &str) -> AliasResult<AliasChange> {
        self.ensure_fresh();
        let result = self.aliases.add(category, alias, target);
        self.rebuild_after(&result);
        result
    }

    /// Delete an alias, persist and rebuild the vocabulary.
    pub fn remove_alias(&self, category: AliasCategory, alias: &str) -> AliasResult<String> {
        self.ensure_fresh();
        let result = self.aliases.remove(category, alias);
        self.rebuild_after(&result);
        result
    }

    fn rebuild_after<T>(&self, result: &AliasResult<T>) {
        match result {
            Ok(_) | Err(AliasError::Persist(_)) => self.rebuild_vocabulary(),
            Err(_) => {}
        }
    }

    /// Canonical hero name for a nickname, English name or hero alias.
    pub fn resolve_hero_name(&self, query: &str) -> Option<String> {
        self.ensure_fresh();
        let folded = query.trim().to_lowercase();
        if folded.is_empty() {
            return None;
        }
        if let Some(target) = self.aliases.lookup(AliasCategory::Hero, &folded) {
            return Some(target);
        }
        HERO_NICKNAMES
            .iter()
            .find(|(nick, hero)| nick.to_lowercase() == folded || hero.to_lowercase() == folded)
            .map(|(_, hero)| hero.to_string())
    }

    /// Rewrite a query for an English-language build database.
    ///
    /// Vocabulary hits become their canonical values; other tokens are
    /// translated through item names.
    pub fn translate_build_query(&self, query: &str) -> BuildQuery {
        self.ensure_fresh();
        let vocab = self.vocabulary();
        let catalog = self.catalog();
        let tokens = Tokenizer::new(&vocab, self.config.min_decompose_chars).tokenize(query);

        let mut search = Vec::with_capacity(tokens.len());
        let mut display = Vec::with_capacity(tokens.len());
        for token in &tokens {
            if let Some(entry) = vocab.lookup(token) {
                let value = match entry.facet {
                    Facet::Tag | Facet::Size => {
                        entry.value.split('/').next().unwrap_or("").trim().to_string()
                    }
                    Facet::Hero | Facet::Tier => entry.value.clone(),
                };
                search.push(value);
                display.push(format!("{}:{}", entry.facet.label(), entry.value));
                continue;
            }

            let english = translate_item_name(&catalog, token);
            if english != *token {
                display.push(format!("{token}→{english}"));
            } else {
                display.push(token.clone());
            }
            search.push(english);
        }

        BuildQuery {
            search_term: search.join(" "),
            display: display.join(" + "),
        }
    }
}

fn is_exact(entity: &EntityRef<'_>, folded: &str) -> bool {
    let eq = |name: &str| !name.is_empty() && name.to_lowercase() == folded;
    match *entity {
        EntityRef::Monster(key, _) if eq(key) => true,
        EntityRef::Merchant(m) => eq(&m.name),
        _ => eq(entity.native_name()) || eq(entity.english_name()),
    }
}

fn keyword_search<'a>(catalog: &'a Catalog, kind: EntityKind, query: &str) -> Vec<EntityRef<'a>> {
    match kind {
        EntityKind::Item => filter::search_items(catalog, query)
            .into_iter()
            .map(EntityRef::Item)
            .collect(),
        EntityKind::Monster => filter::search_monsters(catalog, query)
            .into_iter()
            .map(|(k, m)| EntityRef::Monster(k, m))
            .collect(),
        EntityKind::Skill => filter::search_skills(catalog, query)
            .into_iter()
            .map(EntityRef::Skill)
            .collect(),
        EntityKind::Event => filter::search_events(catalog, query, &[])
            .into_iter()
            .map(EntityRef::Event)
            .collect(),
        EntityKind::Merchant => filter::search_merchants(catalog, query)
            .into_iter()
            .map(EntityRef::Merchant)
            .collect(),
    }
}

fn find_carried_item(catalog: &Catalog, folded: &str) -> Option<(MonsterLoot, String)> {
    catalog.monsters.iter().find_map(|(key, monster)| {
        monster
            .items
            .iter()
            .find(|loot| loot.name.to_lowercase() == folded || loot.name_en.to_lowercase() == folded)
            .map(|loot| (loot.clone(), EntityRef::Monster(key, monster).display_name()))
    })
}

fn translate_item_name(catalog: &Catalog, name: &str) -> String {
    let folded = name.to_lowercase();
    catalog
        .items
        .iter()
        .find(|i| i.name_cn.to_lowercase() == folded && !i.name_en.is_empty())
        .map_or_else(|| name.to_string(), |i| i.name_en.clone())
}
