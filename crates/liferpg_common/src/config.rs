//! Configuration management for LifeRPG.
//!
//! Loads settings from `$XDG_CONFIG_HOME/liferpg/config.toml` (or an explicit
//! path) or uses defaults.
//!
//! ```toml
//! [database]
//! path = "/home/me/.local/share/liferpg/liferpg.db"
//!
//! [catalog]
//! path = "/home/me/.config/liferpg/quests.toml"
//!
//! [logging]
//! level = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::quest_catalog::QuestCatalog;

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "LIFERPG_CONFIG";

/// Environment override for the database location
pub const DB_ENV: &str = "LIFERPG_DB";

/// Fallback database file when no data directory is known
pub const FALLBACK_DB_PATH: &str = "liferpg.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database file
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Resolve the database file.
    ///
    /// Priority:
    /// 1. `path` from the config file (or `--db`)
    /// 2. `$LIFERPG_DB`
    /// 3. `<data dir>/liferpg/liferpg.db`
    /// 4. `./liferpg.db`
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        if let Ok(path) = std::env::var(DB_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::data_dir()
            .map(|dir| dir.join("liferpg").join("liferpg.db"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DB_PATH))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Custom quest catalog file; the built-in catalog is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn load_catalog(&self) -> Result<QuestCatalog> {
        match &self.path {
            Some(path) => QuestCatalog::from_toml_path(path),
            None => Ok(QuestCatalog::builtin()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("liferpg").join("config.toml"))
    }

    /// Load config.
    ///
    /// An explicit path or `$LIFERPG_CONFIG` must exist and parse. The default
    /// location may be absent, in which case defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Self::load_from_path(Path::new(&path));
            }
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            Some(path) => {
                warn!("Config not found at {}, using defaults", path.display());
                Ok(Config::default())
            }
            None => Ok(Config::default()),
        }
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
