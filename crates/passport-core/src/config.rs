//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AuthError, AuthResult};
use crate::paths::Paths;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// app_id this client registers its access tokens under. Each installed
/// client application carries its own value.
pub const DEFAULT_APP_ID: &str = "passport-desktop";

/// Client configuration, persisted as JSON next to the session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Application namespace for issued access tokens.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Seconds between scheduler polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            app_id: default_app_id(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Config {
    /// Defaults overridden from the environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load from the config file when present, then apply env overrides.
    pub fn load(paths: &Paths) -> AuthResult<Self> {
        let config_path = paths.config_file();
        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };
        config.load_from_env();
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> AuthResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Internal(format!("read config: {e}")))?;
        serde_json::from_str(&content)
            .map_err(|e| AuthError::Internal(format!("parse config: {e}")))
    }

    pub fn save(&self, paths: &Paths) -> AuthResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AuthError::Internal(format!("serialize config: {e}")))?;
        std::fs::write(paths.config_file(), content)
            .map_err(|e| AuthError::Internal(format!("write config: {e}")))?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        if let Ok(level) = std::env::var("PASSPORT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(app_id) = std::env::var("PASSPORT_APP_ID") {
            self.app_id = app_id;
        }
    }
}
