// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use crate::error::ConfigError;
use crate::rules::RuleBook;

/// Prefix of every environment variable read into [`AppConfig`].
pub const ENV_PREFIX: &str = "ROSTER_";

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings read from `ROSTER_*` environment variables (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// JSON rule overrides; built-in defaults apply when absent.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            rules_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Ok(envy::prefixed(ENV_PREFIX).from_env::<AppConfig>()?)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, AppConfig>(vars)?)
    }

    /// Rule book from `rules_path`, or the built-in one.
    pub fn rule_book(&self) -> Result<RuleBook, ConfigError> {
        match &self.rules_path {
            Some(path) => RuleBook::load(path),
            None => {
                info!("No rules file configured, using built-in validation rules");
                Ok(RuleBook::default())
            }
        }
    }
}
