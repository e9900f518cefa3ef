//! Runtime configuration for the tokentrack client.
//!
//! The CLI reads and writes `tokentrack.toml` using these types. Path
//! resolution lives in `tokentrack-paths`; everything here works on an
//! explicit path so it can be tested against a temp dir.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokentrack_core::{ModelInfo, ModelRegistry};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "tokentrack.toml";

/// Environment variable overriding `[server] url`.
pub const SERVER_URL_ENV: &str = "TOKENTRACK_SERVER_URL";

pub const DEFAULT_SERVER_URL: &str = "https://ai-backend-for-token.onrender.com/api";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Top-level configuration (persisted as `tokentrack.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrackerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    /// Extra models appended to the built-in registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSettings {
    #[serde(default = "default_chart_window")]
    pub chart_window: usize,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            chart_window: default_chart_window(),
            recent_limit: default_recent_limit(),
            default_model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    /// Reject a sync whose stats total disagrees with its logs.
    #[serde(default = "default_true")]
    pub require_consistent_totals: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            require_consistent_totals: true,
        }
    }
}

impl TrackerConfig {
    /// Built-in models plus any configured extras.
    pub fn model_registry(&self) -> ModelRegistry {
        ModelRegistry::with_extra(self.models.iter().cloned())
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_chart_window() -> usize {
    tokentrack_core::projection::DEFAULT_CHART_WINDOW
}
fn default_recent_limit() -> usize {
    tokentrack_core::projection::DEFAULT_RECENT_LIMIT
}
fn default_model() -> String {
    ModelRegistry::DEFAULT_MODEL.to_string()
}

/// Load config from `path`. A missing file yields defaults.
pub fn load_from_path(path: &Path) -> Result<TrackerConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TrackerConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };
    let mut config: TrackerConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    apply_fallbacks(&mut config);
    Ok(config)
}

/// Write config to `path`, creating parent directories.
pub fn save_to_path(config: &TrackerConfig, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    let write_err = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, content).map_err(write_err)
}

/// Apply `TOKENTRACK_SERVER_URL` when set and non-empty.
pub fn apply_env_overrides(config: &mut TrackerConfig) {
    apply_server_url_override(config, std::env::var(SERVER_URL_ENV).ok());
}

fn apply_server_url_override(config: &mut TrackerConfig, value: Option<String>) {
    if let Some(url) = value.filter(|u| !u.trim().is_empty()) {
        config.server.url = url.trim().to_string();
    }
}

/// Replace values that would make the client unusable with defaults.
/// Returns true when any field was updated.
pub fn apply_fallbacks(config: &mut TrackerConfig) -> bool {
    let mut changed = false;

    if config.server.url.trim().is_empty() {
        config.server.url = default_server_url();
        changed = true;
    }
    if config.server.timeout_secs == 0 {
        config.server.timeout_secs = default_timeout_secs();
        changed = true;
    }
    if config.dashboard.chart_window == 0 {
        config.dashboard.chart_window = default_chart_window();
        changed = true;
    }
    if config
        .model_registry()
        .get(&config.dashboard.default_model)
        .is_none()
    {
        config.dashboard.default_model = default_model();
        changed = true;
    }

    changed
}
