//! Tracker configuration loading
//!
//! Loads configuration from `~/.config/projtrack/config.toml` (or the
//! `PROJTRACK_CONFIG` env override). Every field has a default, so a
//! missing file yields a working configuration.
//!
//! The assistant API key is deliberately NOT part of this file: it is a
//! session-scoped secret, re-entered per login, never written to disk.

use crate::errors::Result;
use crate::errors::TrackerError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which role tiers are active in this deployment.
///
/// `ThreeRole` is the full hierarchy. `TwoRole` is the restricted profile
/// with no ProjectManager tier: the manager-or-admin login consults only
/// the super-admin table, and super-admins manage every project directly.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentProfile {
    ThreeRole,
    TwoRole,
}

impl Default for DeploymentProfile {
    fn default() -> Self {
        Self::ThreeRole
    }
}

/// Root configuration for the tracker
#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    /// Path to the tracker SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Active role-tier profile
    #[serde(default)]
    pub deployment_profile: DeploymentProfile,

    /// Bootstrap super-admin seed
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Assistant (LLM completion) settings
    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_db_path() -> String {
    dirs::home_dir()
        .map(|h| {
            h.join(".config")
                .join("projtrack")
                .join("tracker.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "tracker.db".to_string())
}

/// Bootstrap super-admin account, inserted once if the table is empty
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapConfig {
    /// Username of the seeded super-admin
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Initial password for the seeded super-admin (hashed before insert)
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
        }
    }
}

/// Assistant completion endpoint settings
#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Base URL of an OpenAI-compatible chat-completions API
    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,

    /// Model identifier sent with each completion request
    #[serde(default = "default_assistant_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_assistant_temperature")]
    pub temperature: f32,
}

fn default_assistant_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_assistant_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_assistant_temperature() -> f32 {
    0.7
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_base_url(),
            model: default_assistant_model(),
            temperature: default_assistant_temperature(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            deployment_profile: DeploymentProfile::default(),
            bootstrap: BootstrapConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "PROJTRACK_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "config.toml";

    /// Load configuration from file
    ///
    /// Resolution order:
    /// 1. `PROJTRACK_CONFIG` environment variable
    /// 2. `~/.config/projtrack/config.toml`
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "tracker config not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::storage_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: TrackerConfig = toml::from_str(contents)
            .map_err(|e| TrackerError::validation(format!("failed to parse config: {e}")))?;

        cfg.validate();
        Ok(cfg)
    }

    /// Resolve the configuration file path
    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("projtrack")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    /// Validate configuration, warning on suspicious values
    fn validate(&self) {
        if self.bootstrap.admin_password == default_admin_password() {
            tracing::warn!("bootstrap admin password is the default; change it after first login");
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            tracing::warn!(
                temperature = self.assistant.temperature,
                "assistant temperature outside the usual 0.0..=2.0 range"
            );
        }
    }

    /// Get the resolved database path (expanding ~ if needed)
    pub fn resolved_db_path(&self) -> PathBuf {
        let path = &self.db_path;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }
}
