use std::io::{self, BufRead, Write};
use std::sync::Arc;

use bazaar_query::config::AppConfig;
use bazaar_query::core::catalog::Catalog;
use bazaar_query::core::commands::{CommandDispatcher, Reply};
use bazaar_query::core::logging;
use bazaar_query::core::query::{JsonFileAliasStore, QueryEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = logging::init(&logging::default_log_dir());
    log::info!("bazaar-query v{} starting", bazaar_query::VERSION);

    let config = AppConfig::load();
    let data_dir = config.data_dir();
    let catalog = Catalog::load_from_dir(&data_dir);
    if catalog.is_empty() {
        log::warn!("No game data found in {}", data_dir.display());
    }

    let store = JsonFileAliasStore::new(config.alias_path());
    let engine = QueryEngine::new(catalog, Box::new(store), config.query.clone());
    let dispatcher = CommandDispatcher::new(Arc::new(engine));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "q" | "quit" | "exit") {
            break;
        }

        match dispatcher.handle_line(trimmed) {
            Some(Reply::Text(text)) => writeln!(stdout, "{text}\n")?,
            Some(Reply::Sections(sections)) => {
                for section in sections {
                    writeln!(stdout, "{section}\n")?;
                }
            }
            Some(Reply::Card(bytes)) => writeln!(stdout, "[card image, {} bytes]\n", bytes.len())?,
            None => writeln!(stdout, "未知指令，输入 /tbzhelp 查看帮助。\n")?,
        }
        stdout.flush()?;
    }

    log::info!("bazaar-query shutting down");
    Ok(())
}
