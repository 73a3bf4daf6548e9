use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::query::QueryConfig;

const APP_DIR: &str = "bazaar-query";
const DEFAULT_ALIAS_FILE: &str = "aliases.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub query: QueryConfig,
}

/// Where game data and aliases live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
    /// Alias file, relative to the data directory unless absolute.
    pub alias_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from `<config_dir>/bazaar-query/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if !config_path.exists() {
            log::debug!("No config file at {}, using defaults", config_path.display());
            return Self::default();
        }
        match Self::from_toml_file(&config_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to load config at {}: {e}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Resolved data directory (override or platform default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Resolved alias file path.
    pub fn alias_path(&self) -> PathBuf {
        match &self.data.alias_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir().join(path),
            None => self.data_dir().join(DEFAULT_ALIAS_FILE),
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.data.data_dir.is_none());
        assert_eq!(config.query.suggestion_limit, 8);
        assert_eq!(config.query.page_size, 30);
    }

    #[test]
    fn test_partial_query_table_keeps_defaults() {
        let config = AppConfig::from_toml_str("[query]\nsuggestion_limit = 3\n").unwrap();
        assert_eq!(config.query.suggestion_limit, 3);
        assert_eq!(config.query.min_decompose_chars, 4);
        assert_eq!(config.query.disambiguation_limit, 15);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[query\n"),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data]\ndata_dir = \"/srv/bazaar\"").unwrap();
        let config = AppConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/srv/bazaar"));
        assert_eq!(config.alias_path(), PathBuf::from("/srv/bazaar/aliases.json"));
    }

    #[test]
    fn test_alias_path_absolute_override() {
        let mut config = AppConfig::default();
        config.data.data_dir = Some(PathBuf::from("/tmp/custom"));
        config.data.alias_file = Some(PathBuf::from("/etc/bazaar/aliases.json"));
        assert_eq!(config.alias_path(), PathBuf::from("/etc/bazaar/aliases.json"));
        config.data.alias_file = Some(PathBuf::from("mine.json"));
        assert_eq!(config.alias_path(), PathBuf::from("/tmp/custom/mine.json"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = AppConfig::default();
        config.query.page_size = 10;
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
