/// bazaar-query - game data query assistant for The Bazaar
///
/// Core library providing catalog loading, mixed Chinese/English query
/// understanding, user aliases and chat-command replies.

pub mod config;
pub mod core;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
