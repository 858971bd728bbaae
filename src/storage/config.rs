//! Configuration handling for ege-ingest
//!
//! Configuration is read from the first file found in this order:
//! 1. an explicit `--config <path>`
//! 2. `./ege-ingest.toml`
//! 3. `~/.config/ege-ingest/config.toml` (platform config dir)
//!
//! Missing files fall back to built-in defaults. Store URL and credentials
//! can be overridden from the command line or environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = "ege-ingest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Store credentials are not configured (set [store] identity/password or EGE_PB_IDENTITY/EGE_PB_PASSWORD)")]
    MissingCredentials,
}

/// Superuser login for the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub password: String,
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the PocketBase instance
    pub url: String,

    /// Superuser email
    pub identity: Option<String>,

    pub password: Option<String>,

    /// Records requested per list page
    pub page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8090".to_string(),
            identity: None,
            password: None,
            page_size: 500,
        }
    }
}

impl StoreConfig {
    /// Returns the configured credentials, or an error if either part is missing
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.identity, &self.password) {
            (Some(identity), Some(password)) if !identity.is_empty() && !password.is_empty() => {
                Ok(Credentials {
                    identity: identity.clone(),
                    password: password.clone(),
                })
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Where source documents live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Folder for `ingest <name>`
    pub dir: PathBuf,

    /// Folder for `paragraph <n>`
    pub paragraph_dir: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("source"),
            paragraph_dir: PathBuf::from("source").join("mordkovich"),
        }
    }
}

/// Values used when a document's metadata omits them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub difficulty: String,

    /// Source citation for topic-lookup ingestion
    pub source: String,

    /// Source citation for paragraph ingestion
    pub paragraph_source: String,

    pub year: i32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            difficulty: "1".to_string(),
            source: "Не указан".to_string(),
            paragraph_source: "Мордкович А.Г. Задачник".to_string(),
            year: chrono::Local::now().year(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub sources: SourcesConfig,
    pub defaults: DefaultsConfig,
}

impl Config {
    /// Loads configuration from an explicit path or the default locations
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_file(&local);
        }

        match Self::global_config_path() {
            Some(path) if path.is_file() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Returns the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "ege", "ege-ingest")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads and validates one config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates TOML configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::Invalid("store.url must not be empty".to_string()));
        }
        if self.store.page_size == 0 {
            return Err(ConfigError::Invalid("store.page_size must be positive".to_string()));
        }
        if self.defaults.difficulty.trim().parse::<u32>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "defaults.difficulty must be an integer, got '{}'",
                self.defaults.difficulty
            )));
        }
        Ok(())
    }

    /// Applies command-line / environment overrides for the store
    pub fn with_store_overrides(
        mut self,
        url: Option<String>,
        identity: Option<String>,
        password: Option<String>,
    ) -> Self {
        if let Some(url) = url {
            self.store.url = url;
        }
        if identity.is_some() {
            self.store.identity = identity;
        }
        if password.is_some() {
            self.store.password = password;
        }
        self
    }
}
