//! SportsOrg Configuration Module
//! Handles loading and validating sportsorg.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "sportsorg.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub organization: OrganizationConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, relative paths resolve against the config directory. `:memory:` is accepted.
    pub path: PathBuf,
    /// Apply pending schema migrations when the database is opened
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults
    pub fn load_or_default(config_dir: &Path) -> Result<Self, ConfigError> {
        match Self::load(config_dir) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default_config()),
            other => other,
        }
    }

    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir)?;
        let config_path = config_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn default_config() -> Self {
        Self {
            version: "0.1.0".to_string(),
            organization: OrganizationConfig {
                name: "Sports Organizations".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("./data/sportsorg.db"),
                auto_migrate: true,
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Database location with relative paths anchored at `config_dir`
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        let path = &self.database.path;
        if path.is_absolute() || path == Path::new(crate::engine::database::MEMORY_PATH) {
            path.clone()
        } else {
            config_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default_config();
        config.organization.name = "City League".to_string();
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.organization.name, "City League");
        assert_eq!(loaded.database.path, PathBuf::from("./data/sportsorg.db"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Config::load(dir.path()), Err(ConfigError::NotFound(_))));
        let config = Config::load_or_default(dir.path()).unwrap();
        assert!(config.database.auto_migrate);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"version":"0.1.0","organization":{"name":"x"},"database":{"path":"db.sqlite"}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert!(config.database.auto_migrate);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.database_path(dir.path()), dir.path().join("db.sqlite"));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_memory_path_not_anchored() {
        let mut config = Config::default_config();
        config.database.path = PathBuf::from(":memory:");
        assert_eq!(config.database_path(Path::new("/etc")), PathBuf::from(":memory:"));
    }
}
