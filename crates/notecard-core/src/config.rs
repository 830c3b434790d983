//! Configuration management for notecard.
//!
//! Loads configuration from ${NOTECARD_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the preview server listens on.
    pub bind: String,
    /// Client cache lifetime for rendered images, in seconds.
    pub cache_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            cache_max_age_secs: 604_800,
        }
    }
}

/// Remote media and avatar fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-fetch timeout; a slow host only loses its own image.
    pub timeout_secs: u64,
    /// Bodies larger than this are rejected.
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 4,
            max_bytes: 8 * 1024 * 1024,
            user_agent: concat!("notecard/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Where content documents are resolved from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory holding `<reference>.json` documents.
    /// Defaults to `${NOTECARD_HOME}/content` when unset.
    pub dir: Option<PathBuf>,
}

/// Moderation gate applied before rendering.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModerationConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub banned_references: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub banned_authors: Vec<String>,
}

/// Structured card settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardConfig {
    /// Text stamped in the card's bottom-right corner.
    pub brand: String,
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        Self {
            brand: "gambit.golf".to_string(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, logs are also written to daily files in this directory.
    pub dir: Option<PathBuf>,
}

pub mod paths {
    //! Path resolution for notecard configuration and data directories.
    //!
    //! NOTECARD_HOME resolution order:
    //! 1. NOTECARD_HOME environment variable (if set)
    //! 2. ~/.config/notecard (default)
    //! 3. ./.notecard when no home directory is known

    use std::path::PathBuf;

    /// Returns the notecard home directory.
    pub fn notecard_home() -> PathBuf {
        if let Ok(home) = std::env::var("NOTECARD_HOME") {
            return PathBuf::from(home);
        }

        std::env::var("HOME").map_or_else(
            |_| PathBuf::from(".notecard"),
            |home| PathBuf::from(home).join(".config").join("notecard"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        notecard_home().join("config.toml")
    }

    /// Returns the default content directory.
    pub fn content_dir() -> PathBuf {
        notecard_home().join("content")
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub content: ContentConfig,
    pub moderation: ModerationConfig,
    pub scorecard: ScorecardConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Content directory, falling back to `${NOTECARD_HOME}/content`.
    pub fn content_dir(&self) -> PathBuf {
        self.content.dir.clone().unwrap_or_else(paths::content_dir)
    }

    /// Effective settings as TOML, with unset optional paths omitted.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config")
    }
}
