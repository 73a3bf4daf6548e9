
pub mod catalog;
pub mod commands;
pub mod format;
pub mod logging;

// Query understanding: aliases, vocabulary, tokenizer, filters, suggestions
pub mod query;
