//! Chat Command Surface
//!
//! Parses `/tbz*` command lines into a [`Command`] and answers them with a
//! [`Reply`] using the [`QueryEngine`].
//!
//! ```text
//!  "/tbzitem 短剑" ─▶ Command::parse ─▶ CommandDispatcher::dispatch ─▶ Reply
//!                                             │
//!                                 QueryEngine + CardRenderer (optional)
//! ```

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::core::catalog::{EntityKind, EntityRecord};
use crate::core::format;
use crate::core::query::{AliasCategory, AliasError, LookupOutcome, QueryEngine};

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),
}

/// `/tbzalias` subcommands. Categories stay raw until dispatch so an
/// unknown one can be reported with the list of valid names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasCommand {
    Help,
    List(Option<String>),
    Add {
        category: String,
        alias: String,
        target: String,
    },
    /// `add` with missing arguments.
    AddUsage,
    Remove {
        category: String,
        alias: String,
    },
    /// `del` with missing arguments.
    RemoveUsage,
    Unknown(String),
}

impl AliasCommand {
    fn parse(args: &str) -> Self {
        let mut parts = args.split_whitespace();
        let Some(action) = parts.next() else {
            return AliasCommand::Help;
        };
        let rest: Vec<&str> = parts.collect();
        match action.to_lowercase().as_str() {
            "list" => AliasCommand::List(rest.first().map(|c| c.to_lowercase())),
            "add" => match rest.as_slice() {
                [category, alias, target @ ..] if !target.is_empty() => AliasCommand::Add {
                    category: category.to_lowercase(),
                    alias: alias.to_string(),
                    target: target.join(" "),
                },
                _ => AliasCommand::AddUsage,
            },
            "del" | "delete" | "rm" | "remove" => match rest.as_slice() {
                [category, alias, ..] => AliasCommand::Remove {
                    category: category.to_lowercase(),
                    alias: alias.to_string(),
                },
                _ => AliasCommand::RemoveUsage,
            },
            other => AliasCommand::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lookup { kind: EntityKind, query: String },
    Search(String),
    Alias(AliasCommand),
    Help,
}

impl Command {
    /// Parse one command line. The leading slash is optional.
    pub fn parse(line: &str) -> Result<Self, ParseCommandError> {
        let line = line.trim();
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };
        if name.is_empty() {
            return Err(ParseCommandError::Empty);
        }

        let lookup = |kind| Command::Lookup {
            kind,
            query: args.to_string(),
        };
        Ok(match name.trim_start_matches('/').to_lowercase().as_str() {
            "tbzitem" => lookup(EntityKind::Item),
            "tbzmonster" => lookup(EntityKind::Monster),
            "tbzskill" => lookup(EntityKind::Skill),
            "tbzevent" => lookup(EntityKind::Event),
            "tbzmerchant" => lookup(EntityKind::Merchant),
            "tbzsearch" => Command::Search(args.to_string()),
            "tbzalias" => Command::Alias(AliasCommand::parse(args)),
            "tbzhelp" => Command::Help,
            _ => return Err(ParseCommandError::Unknown(name.to_string())),
        })
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

// ============================================================================
// Replies and rendering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Several messages sent together, e.g. a paged search listing.
    Sections(Vec<String>),
    /// Encoded image bytes from a [`CardRenderer`].
    Card(Vec<u8>),
}

impl Reply {
    /// Text content, if this is not an image.
    pub fn text(&self) -> Option<String> {
        match self {
            Reply::Text(t) => Some(t.clone()),
            Reply::Sections(s) => Some(s.join("\n\n")),
            Reply::Card(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No card layout for {0:?}")]
    Unsupported(EntityKind),

    #[error("Card render failed: {0}")]
    Failed(String),
}

/// Turns a record into an image card.
pub trait CardRenderer: Send + Sync {
    fn render(&self, record: &EntityRecord) -> Result<Vec<u8>, RenderError>;
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct CommandDispatcher {
    engine: Arc<QueryEngine>,
    renderer: Option<Box<dyn CardRenderer>>,
}

impl CommandDispatcher {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        Self {
            engine,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn CardRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Parse and answer a raw line. `None` when the line is not a command.
    pub fn handle_line(&self, line: &str) -> Option<Reply> {
        match Command::parse(line) {
            Ok(command) => Some(self.dispatch(&command)),
            Err(e) => {
                log::debug!("Ignoring input: {e}");
                None
            }
        }
    }

    pub fn dispatch(&self, command: &Command) -> Reply {
        match command {
            Command::Lookup { kind, query } => self.lookup(*kind, query),
            Command::Search(query) => self.search(query),
            Command::Alias(alias) => Reply::Text(self.alias(alias)),
            Command::Help => Reply::Text(format::help_text(&self.engine.catalog())),
        }
    }

    fn lookup(&self, kind: EntityKind, query: &str) -> Reply {
        if kind == EntityKind::Merchant {
            if let Some(reply) = self.merchant_preamble(query) {
                return Reply::Text(reply);
            }
        }
        if query.is_empty() {
            return Reply::Text(lookup_prompt(kind).to_string());
        }

        match self.engine.lookup(kind, query) {
            LookupOutcome::Found(record) => self.render(&record),
            LookupOutcome::Carried { item, owner } => {
                Reply::Text(format::format_carried(&item, &owner))
            }
            LookupOutcome::Ambiguous(msg) | LookupOutcome::NotFound(msg) => Reply::Text(msg),
        }
    }

    /// Replies that pre-empt a merchant lookup: no data, or no query.
    fn merchant_preamble(&self, query: &str) -> Option<String> {
        let catalog = self.engine.catalog();
        if catalog.merchants.is_empty() {
            return Some("⚠️ 商人数据尚未加载。请检查数据目录中的 merchants_db.json。".to_string());
        }
        if !query.is_empty() {
            return None;
        }
        let trainers = catalog.merchants.iter().filter(|m| m.is_trainer()).count();
        let merchants = catalog.merchants.iter().filter(|m| m.is_merchant()).count();
        Some(format!(
            "请输入商人名称查询，例如:\n\
             \x20 /tbzmerchant Aila\n\
             \x20 /tbzmerchant Chronos\n\n\
             📊 当前数据: {merchants}个商人 | {trainers}个训练师\n\n\
             💡 也可按条件搜索:\n\
             \x20 /tbzmerchant Weapon (搜索卖武器的商人)\n\
             \x20 /tbzmerchant Diamond (搜索钻石品质商人)\n\
             \x20 /tbzmerchant Vanessa (搜索某英雄可遇到的商人)"
        ))
    }

    fn render(&self, record: &EntityRecord) -> Reply {
        if let Some(renderer) = &self.renderer {
            if record.kind() != EntityKind::Event {
                match renderer.render(record) {
                    Ok(bytes) => return Reply::Card(bytes),
                    Err(e) => log::warn!(
                        "{} card render failed, falling back to text: {}",
                        record.kind().label(),
                        e
                    ),
                }
            }
        }
        Reply::Text(format::format_record(record))
    }

    fn search(&self, query: &str) -> Reply {
        let catalog = self.engine.catalog();
        if query.is_empty() {
            return Reply::Text(format::search_help(&catalog));
        }
        let report = self.engine.search(query);
        if report.is_empty() {
            return Reply::Text(format!(
                "未找到与「{query}」相关的结果。\n使用 /tbzsearch 查看搜索帮助。"
            ));
        }
        Reply::Sections(format::format_search(&report, self.engine.config().page_size))
    }

    fn alias(&self, command: &AliasCommand) -> String {
        match command {
            AliasCommand::Help => format::alias_help(self.engine.alias_count()),
            AliasCommand::List(category) => {
                let category = match category.as_deref().map(AliasCategory::from_str) {
                    None => None,
                    Some(Ok(c)) => Some(c),
                    Some(Err(_)) => return unknown_category(category.as_deref().unwrap_or("")),
                };
                format::format_alias_list(&self.engine.list_aliases(category), category)
            }
            AliasCommand::AddUsage => {
                "用法: /tbzalias add <分类> <别名> <目标>\n示例: /tbzalias add hero 猪猪 Pygmalien"
                    .to_string()
            }
            AliasCommand::RemoveUsage => {
                "用法: /tbzalias del <分类> <别名>\n示例: /tbzalias del hero 猪猪".to_string()
            }
            AliasCommand::Add {
                category,
                alias,
                target,
            } => {
                let Ok(cat) = category.parse::<AliasCategory>() else {
                    return unknown_category(category);
                };
                match self.engine.add_alias(cat, alias, target) {
                    Ok(change) => match change.previous {
                        Some(old) => format!("✅ 已更新别名 [{cat}] {alias} → {target} (原: {old})"),
                        None => format!("✅ 已添加别名 [{cat}] {alias} → {target}"),
                    },
                    Err(e) => alias_failure(&e, format!("[{cat}] {alias} → {target}")),
                }
            }
            AliasCommand::Remove { category, alias } => {
                let Ok(cat) = category.parse::<AliasCategory>() else {
                    return unknown_category(category);
                };
                match self.engine.remove_alias(cat, alias) {
                    Ok(old) => format!("✅ 已删除别名 [{cat}] {alias} → {old}"),
                    Err(AliasError::AliasNotFound { .. }) => format!("未找到别名 [{cat}] {alias}"),
                    Err(e) => alias_failure(&e, format!("[{cat}] {alias}")),
                }
            }
            AliasCommand::Unknown(_) => {
                "未知操作，请使用 list/add/del。输入 /tbzalias 查看帮助。".to_string()
            }
        }
    }
}

fn lookup_prompt(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Item => "请输入物品名称，例如: /tbzitem 短剑",
        EntityKind::Monster => "请输入怪物名称，例如: /tbzmonster 火灵",
        EntityKind::Skill => "请输入技能名称，例如: /tbzskill 热情如火",
        EntityKind::Event => "请输入事件名称，例如: /tbzevent 奇异蘑菇",
        EntityKind::Merchant => "请输入商人名称，例如: /tbzmerchant Aila",
    }
}

fn unknown_category(category: &str) -> String {
    format!("未知分类「{}」，可用分类: {}", category, AliasCategory::names())
}

fn alias_failure(error: &AliasError, what: String) -> String {
    match error {
        AliasError::Persist(_) => format!("⚠️ 别名 {what} 已生效，但保存失败: {error}"),
        AliasError::EmptyAlias => "别名和目标不能为空".to_string(),
        other => format!("❌ 别名操作失败: {other}"),
    }
}
