use crate::error::{Error, Result};
use std::{env, path::PathBuf, sync::OnceLock};

static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub file_name: String,
}

impl Config {
    const DEFAULT_PROMPT: &'static str = "> ";

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log: LogConfig::from_lookup(&lookup),
            prompt: lookup("DOM_RELAY_PROMPT").unwrap_or_else(|| Self::DEFAULT_PROMPT.into()),
        }
    }

    /// Initialize the global config (call once at startup).
    ///
    /// # Errors
    ///
    /// Returns error if config is already initialized.
    pub fn init(self) -> Result<()> {
        GLOBAL_CONFIG
            .set(self)
            .map_err(|_| Error::other("config already initialized"))
    }
}

/// Get global config (initialized by `Config::init(self)`).
#[must_use]
pub fn global_config() -> Config {
    GLOBAL_CONFIG.get().cloned().unwrap_or_default()
}

impl LogConfig {
    const DEFAULT_DIR: &'static str = ".logs";
    const DEFAULT_FILE_NAME: &'static str = "dom-relay.log";

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            dir: lookup("DOM_RELAY_LOG_DIR")
                .filter(|d| !d.trim().is_empty())
                .map_or_else(|| Self::DEFAULT_DIR.into(), PathBuf::from),
            file_name: lookup("DOM_RELAY_LOG_FILE")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_FILE_NAME.into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            prompt: Self::DEFAULT_PROMPT.into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: Self::DEFAULT_DIR.into(),
            file_name: Self::DEFAULT_FILE_NAME.into(),
        }
    }
}
