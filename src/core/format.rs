//! Plain-text rendering of catalog records, search reports and help.
//!
//! This is the fallback whenever no card renderer is configured or the
//! renderer fails. Output is Chinese-first, matching the player community.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::core::catalog::{
    clean_tier, split_bilingual, Catalog, EntityRecord, Event, Item, Merchant, Monster,
    MonsterLoot, Skill,
};
use crate::core::query::{AliasCategory, AliasEntry, SearchReport};

const RULE: &str = "━━━━━━━━━━━━━━━━━━";

/// Loot lines shown per monster section.
const MONSTER_LOOT_LIMIT: usize = 8;
const ITEM_SKILL_LIMIT: usize = 5;

const HERO_NATIVE: &[(&str, &str)] = &[
    ("Common", "通用"),
    ("Dooley", "杜利"),
    ("Jules", "朱尔斯"),
    ("Mak", "马克"),
    ("Pygmalien", "皮格马利翁"),
    ("Stelle", "斯黛拉"),
    ("Vanessa", "瓦妮莎"),
];

const TIER_NATIVE: &[(&str, &str)] = &[
    ("Bronze", "青铜"),
    ("Silver", "白银"),
    ("Gold", "黄金"),
    ("Diamond", "钻石"),
    ("Legendary", "传说"),
];

pub fn tier_emoji(tier: &str) -> &'static str {
    match tier {
        "Bronze" => "🥉",
        "Silver" => "🥈",
        "Gold" => "🥇",
        "Diamond" => "💎",
        _ => "",
    }
}

fn hero_native(hero: &str) -> &str {
    HERO_NATIVE
        .iter()
        .find(|(en, _)| *en == hero)
        .map_or(hero, |(_, cn)| *cn)
}

fn tier_native(tier: &str) -> &str {
    TIER_NATIVE
        .iter()
        .find(|(en, _)| *en == tier)
        .map_or(tier, |(_, cn)| *cn)
}

/// Scalar payload field rendered as text, if present and non-empty.
fn extra_text(extra: &Map<String, Value>, key: &str) -> Option<String> {
    match extra.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `中文(English)` for a bilingual field, or whichever half exists.
fn bilingual(raw: &str) -> String {
    match split_bilingual(raw) {
        (en, "") => en.to_string(),
        (en, cn) => format!("{cn}({en})"),
    }
}

fn loot_name(loot: &MonsterLoot) -> String {
    let name = if loot.name.is_empty() {
        &loot.name_en
    } else {
        &loot.name
    };
    if !loot.name_en.is_empty() && loot.name_en != *name {
        format!("{}({})", name, loot.name_en)
    } else {
        name.to_string()
    }
}

// ============================================================================
// Records
// ============================================================================

pub fn format_record(record: &EntityRecord) -> String {
    match record {
        EntityRecord::Item(item) => format_item(item),
        EntityRecord::Monster { key, monster } => format_monster(key, monster),
        EntityRecord::Skill(skill) => format_skill(skill),
        EntityRecord::Event(event) => format_event(event),
        EntityRecord::Merchant(merchant) => format_merchant(merchant),
    }
}

pub fn format_item(item: &Item) -> String {
    let tier = clean_tier(&item.starting_tier);
    let mut lines = vec![
        format!(
            "📦 【{}】({}) {}{}",
            item.name_cn,
            item.name_en,
            tier_emoji(tier),
            item.starting_tier
        ),
        String::new(),
    ];

    for (title, skills) in [("⚔️ 主动技能:", &item.skills), ("🛡️ 被动技能:", &item.skills_passive)] {
        if skills.is_empty() {
            continue;
        }
        lines.push(title.to_string());
        lines.extend(
            skills
                .iter()
                .take(ITEM_SKILL_LIMIT)
                .map(|s| format!("  {}", s.text())),
        );
        lines.push(String::new());
    }

    let mut details = Vec::new();
    if !item.heroes.is_empty() {
        details.push(format!("英雄: {}", bilingual(&item.heroes)));
    }
    if !item.tags.is_empty() {
        details.push(format!("标签: {}", item.tags));
    }
    if !item.hidden_tags.is_empty() {
        details.push(format!("隐藏标签: {}", item.hidden_tags));
    }
    if !item.size.is_empty() {
        details.push(format!("尺寸: {}", bilingual(&item.size)));
    }
    match item.extra.get("cooldown").and_then(Value::as_f64) {
        Some(cd) if cd == 0.0 => details.push("冷却: 被动/无冷却".to_string()),
        Some(cd) => details.push(format!("冷却: {cd}秒")),
        None => {}
    }
    for (key, label) in [
        ("available_tiers", "可用品质"),
        ("buy_price", "购买价格"),
        ("sell_price", "出售价格"),
    ] {
        if let Some(value) = extra_text(&item.extra, key) {
            details.push(format!("{label}: {value}"));
        }
    }
    if !details.is_empty() {
        lines.push("📊 属性:".to_string());
        lines.extend(details.into_iter().map(|d| format!("  {d}")));
        lines.push(String::new());
    }

    let stats: Vec<String> = [
        ("damage", "伤害"),
        ("heal", "治疗"),
        ("shield", "护盾"),
        ("burn", "灼烧"),
        ("poison", "中毒"),
        ("regen", "再生"),
        ("lifesteal", "吸血"),
        ("ammo", "弹药"),
        ("crit", "暴击"),
        ("multicast", "多重触发"),
    ]
    .into_iter()
    .filter_map(|(key, label)| {
        let value = extra_text(&item.extra, key).filter(|v| v != "0")?;
        Some(match extra_text(&item.extra, &format!("{key}_tiers")) {
            Some(growth) => format!("  {label}: {value} (成长: {growth})"),
            None => format!("  {label}: {value}"),
        })
    })
    .collect();
    if !stats.is_empty() {
        lines.push("📈 数值:".to_string());
        lines.extend(stats);
    }

    lines.join("\n").trim_end().to_string()
}

pub fn format_skill(skill: &Skill) -> String {
    let tier = clean_tier(&skill.starting_tier);
    let mut lines = vec![
        format!(
            "🎯 【{}】({}) {}{}",
            skill.name_cn,
            skill.name_en,
            tier_emoji(tier),
            skill.starting_tier
        ),
        String::new(),
    ];
    for desc in [&skill.description_cn, &skill.description_en] {
        if !desc.is_empty() {
            lines.push(format!("📝 {desc}"));
        }
    }
    lines.push(String::new());
    if !skill.heroes.is_empty() {
        lines.push(format!("🦸 英雄: {}", bilingual(&skill.heroes)));
    }
    if let Some(tiers) = extra_text(&skill.extra, "available_tiers") {
        lines.push(format!("📊 可用品质: {tiers}"));
    }
    if !skill.size.is_empty() {
        lines.push(format!("📏 尺寸: {}", bilingual(&skill.size)));
    }
    if !skill.tags.is_empty() {
        lines.push(format!("🏷️ 标签: {}", skill.tags));
    }
    if !skill.hidden_tags.is_empty() {
        lines.push(format!("🏷️ 隐藏标签: {}", skill.hidden_tags));
    }
    lines.join("\n").trim_end().to_string()
}

pub fn format_monster(key: &str, monster: &Monster) -> String {
    let mut lines = vec![
        format!("🐉 【{}】({})", monster.native_name(key), monster.name),
        String::new(),
    ];
    for (field, label) in [("available", "📅 出现时间"), ("health", "❤️ 生命值"), ("level", "⭐ 等级")] {
        if let Some(value) = extra_text(&monster.extra, field) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.push(String::new());

    if !monster.skills.is_empty() {
        lines.push("⚔️ 技能:".to_string());
        for skill in monster.skills.iter().take(MONSTER_LOOT_LIMIT) {
            let tier = skill.tier_label();
            lines.push(format!(
                "  {} {} [{}]",
                tier_emoji(clean_tier(tier)),
                loot_name(skill),
                tier
            ));
            lines.extend(skill.description().iter().take(2).map(|d| format!("    {d}")));
        }
        if monster.skills.len() > MONSTER_LOOT_LIMIT {
            lines.push(format!(
                "  ... 还有{}个技能",
                monster.skills.len() - MONSTER_LOOT_LIMIT
            ));
        }
        lines.push(String::new());
    }

    let mut seen = HashSet::new();
    let unique: Vec<&MonsterLoot> = monster
        .items
        .iter()
        .filter(|loot| seen.insert(loot.identity()))
        .collect();
    if !unique.is_empty() {
        lines.push("🎒 物品:".to_string());
        for loot in unique.iter().take(MONSTER_LOOT_LIMIT) {
            let tier = loot.tier_label();
            lines.push(format!(
                "  {} {} [{}]",
                tier_emoji(clean_tier(tier)),
                loot_name(loot),
                tier
            ));
            if let Some(first) = loot.description().first() {
                lines.push(format!("    {first}"));
            }
        }
        if unique.len() > MONSTER_LOOT_LIMIT {
            lines.push(format!("  ... 还有{}个物品", unique.len() - MONSTER_LOOT_LIMIT));
        }
    }

    lines.join("\n").trim_end().to_string()
}

pub fn format_event(event: &Event) -> String {
    let tier = if event.tier.is_empty() {
        String::new()
    } else {
        format!(" {}{}", tier_emoji(&event.tier), event.tier)
    };
    let mut lines = vec![
        format!("🎲 【{}】({}){}", event.name, event.name_en, tier),
        String::new(),
    ];

    if !event.heroes.is_empty() {
        let heroes: Vec<String> = event
            .heroes
            .iter()
            .map(|h| format!("{}({})", hero_native(h), h))
            .collect();
        lines.push(format!("🦸 适用英雄: {}", heroes.join(", ")));
        lines.push(String::new());
    }

    if !event.choices.is_empty() {
        lines.push(format!("📋 选项 ({}个):", event.choices.len()));
        for (i, choice) in event.choices.iter().enumerate() {
            let name = match (choice.name_zh.is_empty(), choice.name.is_empty()) {
                (false, false) => format!("{}({})", choice.name_zh, choice.name),
                (false, true) => choice.name_zh.clone(),
                _ => choice.name.clone(),
            };
            lines.push(format!("  {}. {}", i + 1, name));
            let desc = if choice.description_zh.is_empty() {
                &choice.description
            } else {
                &choice.description_zh
            };
            if !desc.is_empty() {
                lines.push(format!("     {desc}"));
            }
        }
    }

    lines.join("\n").trim_end().to_string()
}

pub fn format_merchant(merchant: &Merchant) -> String {
    let heroes: Vec<&str> = merchant.heroes.iter().map(|h| hero_native(h)).collect();
    let mut lines = vec![
        format!("🏪 {}", merchant.name),
        RULE.to_string(),
        format!("📋 类型: {}", merchant.category_label()),
        format!("💎 品质: {}({})", tier_native(&merchant.tier), merchant.tier),
        format!("📝 描述: {}", merchant.description),
        format!("👥 可用英雄: {}", heroes.join(" | ")),
    ];
    if !merchant.name_slug.is_empty() {
        lines.push(format!("🔗 https://bazaarforge.gg/merchants/{}", merchant.name_slug));
    }
    lines.join("\n")
}

/// An item known only from a monster's loadout.
pub fn format_carried(item: &MonsterLoot, owner: &str) -> String {
    let tier = item.tier_label();
    let description = item.description();
    let desc = if description.is_empty() {
        "暂无描述".to_string()
    } else {
        description.join("\n")
    };
    format!(
        "📦 【{}】 {}{}\n\n📝 {}\n\n🐉 所属怪物: {}",
        item.name,
        tier_emoji(clean_tier(tier)),
        tier,
        desc,
        owner
    )
}

// ============================================================================
// Search results
// ============================================================================

/// Render a search report as message sections, paging long lists.
pub fn format_search(report: &SearchReport, page_size: usize) -> Vec<String> {
    let page_size = page_size.max(1);
    let mut sections = Vec::new();

    let mut header = format!("🔍 搜索「{}」的结果 (共{}条)", report.query, report.total());
    if report.conditions.has_filters() {
        header.push_str(&format!("\n📋 识别条件: {}", report.conditions.summary()));
    }
    sections.push(header);

    if !report.monsters.is_empty() {
        let mut lines = vec![format!("🐉 怪物 ({}个):", report.monsters.len())];
        lines.extend(
            report
                .monsters
                .iter()
                .map(|(key, m)| format!("  • {}({})", m.native_name(key), m.name)),
        );
        sections.push(lines.join("\n"));
    }

    let item_lines: Vec<String> = report
        .items
        .iter()
        .map(|it| {
            let tier = clean_tier(&it.starting_tier);
            let hero = it.heroes.split('/').next().unwrap_or("").trim();
            format!("  {} {}({}) - {}", tier_emoji(tier), it.name_cn, it.name_en, hero)
        })
        .collect();
    sections.extend(paged("📦 物品", &item_lines, page_size));

    let skill_lines: Vec<String> = report
        .skills
        .iter()
        .map(|s| format!("  • {}({})", s.name_cn, s.name_en))
        .collect();
    sections.extend(paged("🎯 技能", &skill_lines, page_size));

    if !report.events.is_empty() {
        let mut lines = vec![format!("🎲 事件 ({}个):", report.events.len())];
        for ev in &report.events {
            let heroes = if ev.heroes.is_empty() || ev.heroes == ["Common"] {
                String::new()
            } else {
                format!(" [{}]", ev.heroes.join(","))
            };
            lines.push(format!(
                "  {} {}({}){} - {}个选项",
                tier_emoji(&ev.tier),
                ev.name,
                ev.name_en,
                heroes,
                ev.choices.len()
            ));
        }
        sections.push(lines.join("\n"));
    }

    sections.push("💡 使用 /tbzitem /tbzskill /tbzevent <名称> 查看详情".to_string());
    sections
}

fn paged(title: &str, lines: &[String], page_size: usize) -> Vec<String> {
    let total = lines.len();
    let pages = total.div_ceil(page_size);
    lines
        .chunks(page_size)
        .enumerate()
        .map(|(i, chunk)| {
            let head = if pages > 1 {
                format!("{title} (第{}/{}页, 共{}个):", i + 1, pages, total)
            } else {
                format!("{title} ({total}个):")
            };
            std::iter::once(head)
                .chain(chunk.iter().cloned())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

// ============================================================================
// Aliases and help
// ============================================================================

pub fn format_alias_list(entries: &[AliasEntry], category: Option<AliasCategory>) -> String {
    let mut lines = vec![format!("📖 别名列表\n{RULE}")];
    let categories: Vec<AliasCategory> = match category {
        Some(c) => vec![c],
        None => AliasCategory::ALL.to_vec(),
    };
    for c in categories {
        let rows: Vec<&AliasEntry> = entries.iter().filter(|e| e.category == c).collect();
        if rows.is_empty() {
            continue;
        }
        lines.push(format!("\n【{}】({}条):", c, rows.len()));
        lines.extend(rows.iter().map(|e| format!("  {} → {}", e.alias, e.target)));
    }
    if lines.len() == 1 {
        lines.push("\n暂无别名配置".to_string());
    }
    lines.join("\n")
}

pub fn alias_help(total: usize) -> String {
    [
        format!("📖 别名管理\n{RULE}"),
        "用法:".to_string(),
        "  /tbzalias list [分类] - 查看别名列表".to_string(),
        "  /tbzalias add <分类> <别名> <目标> - 添加别名".to_string(),
        "  /tbzalias del <分类> <别名> - 删除别名".to_string(),
        String::new(),
        format!("可用分类: {}", AliasCategory::names()),
        String::new(),
        "示例:".to_string(),
        "  /tbzalias list hero".to_string(),
        "  /tbzalias add hero 猪猪 Pygmalien".to_string(),
        "  /tbzalias del hero 猪猪".to_string(),
        format!("\n当前共 {total} 条别名"),
    ]
    .join("\n")
}

pub fn search_help(catalog: &Catalog) -> String {
    let mut tags: Vec<&str> = catalog
        .items
        .iter()
        .flat_map(|i| i.tags.split('|'))
        .flat_map(|t| t.split('/'))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    tags.sort_unstable();
    let mut heroes: Vec<&str> = catalog
        .items
        .iter()
        .flat_map(|i| i.heroes.split('/'))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    heroes.sort_unstable();

    format!(
        "🔍 多条件搜索帮助\n{RULE}\n\
         用法: /tbzsearch [条件...]\n\n\
         支持智能识别，可直接连写条件，无需前缀:\n\
         \x20 /tbzsearch 杜利中型灼烧\n\
         \x20 /tbzsearch 马克黄金武器\n\
         \x20 /tbzsearch 青铜食物\n\n\
         也支持前缀语法:\n\
         \x20 tag:标签名 / 标签:标签名\n\
         \x20 tier:品质 / 品质:品质名\n\
         \x20 hero:英雄 / 英雄:英雄名\n\
         \x20 size:尺寸 / 尺寸:尺寸名\n\n\
         🏷️ 可用标签 ({}个):\n  {}\n\n\
         🦸 可用英雄 ({}个):\n  {}\n\n\
         📊 品质: Bronze(青铜), Silver(白银), Gold(黄金), Diamond(钻石)",
        tags.len(),
        tags.join(", "),
        heroes.len(),
        heroes.join(", ")
    )
}

pub fn help_text(catalog: &Catalog) -> String {
    format!(
        "🎮 The Bazaar 数据查询助手\n{RULE}\n\
         📊 数据: {}怪物 | {}物品 | {}技能 | {}事件 | {}商人\n\n\
         📋 可用指令:\n\n\
         /tbzmonster <名称> - 查询怪物详情\n  示例: /tbzmonster 火灵\n\n\
         /tbzitem <名称> - 查询物品详情\n  示例: /tbzitem 短剑\n\n\
         /tbzskill <名称> - 查询技能详情\n  示例: /tbzskill 热情如火\n\n\
         /tbzevent <名称> - 查询事件选项\n  示例: /tbzevent 奇异蘑菇\n\n\
         /tbzmerchant <名称> - 查询商人/训练师信息\n  示例: /tbzmerchant Aila\n\n\
         /tbzsearch <条件> - 智能多条件搜索\n\
         \x20 直接连写: /tbzsearch 杜利中型灼烧\n\
         \x20 空格分隔: /tbzsearch 马克 黄金 武器\n\
         \x20 前缀语法: /tbzsearch tag:Weapon hero:Mak\n\n\
         /tbzalias - 别名管理(查看/添加/删除)\n\n\
         /tbzhelp - 显示此帮助信息\n{RULE}",
        catalog.monsters.len(),
        catalog.items.len(),
        catalog.skills.len(),
        catalog.events.len(),
        catalog.merchants.len()
    )
}
