//! Engine configuration.
//!
//! Values come from defaults, a JSON file or `WORDBOOK_*` environment
//! variables, and are normalized by [`EngineConfig::validate`] before use.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_INITIAL_SYNC_DELAY_MS: u64 = 2000;
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh-tw";

const ENV_API_BASE_URL: &str = "WORDBOOK_API_BASE_URL";
const ENV_REQUEST_TIMEOUT_SECS: &str = "WORDBOOK_REQUEST_TIMEOUT_SECS";
const ENV_SYNC_INTERVAL_SECS: &str = "WORDBOOK_SYNC_INTERVAL_SECS";
const ENV_INITIAL_SYNC_DELAY_MS: &str = "WORDBOOK_INITIAL_SYNC_DELAY_MS";
const ENV_TARGET_LANGUAGE: &str = "WORDBOOK_TARGET_LANGUAGE";
const ENV_DATA_DIR: &str = "WORDBOOK_DATA_DIR";

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_sync_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

const fn default_initial_sync_delay_ms() -> u64 {
    DEFAULT_INITIAL_SYNC_DELAY_MS
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Base URL of the sync/translation service; remote features are off
    /// without it
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_initial_sync_delay_ms")]
    pub initial_sync_delay_ms: u64,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Directory holding the per-user databases
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            initial_sync_delay_ms: DEFAULT_INITIAL_SYNC_DELAY_MS,
            target_language: default_target_language(),
            data_dir: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `WORDBOOK_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Configuration(format!("invalid config JSON: {error}")))?;
        config.validate()
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = normalize_text_option(lookup(ENV_API_BASE_URL)) {
            config.api_base_url = Some(url);
        }
        if let Some(value) = parse_number(&lookup, ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout_secs = value;
        }
        if let Some(value) = parse_number(&lookup, ENV_SYNC_INTERVAL_SECS)? {
            config.sync_interval_secs = value;
        }
        if let Some(value) = parse_number(&lookup, ENV_INITIAL_SYNC_DELAY_MS)? {
            config.initial_sync_delay_ms = value;
        }
        if let Some(language) = normalize_text_option(lookup(ENV_TARGET_LANGUAGE)) {
            config.target_language = language;
        }
        if let Some(dir) = normalize_text_option(lookup(ENV_DATA_DIR)) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        config.validate()
    }

    /// Trim values and reject ones the engine cannot run with.
    pub fn validate(mut self) -> Result<Self> {
        self.api_base_url = match normalize_text_option(self.api_base_url.take()) {
            Some(url) if is_http_url(&url) => Some(url.trim_end_matches('/').to_string()),
            Some(_) => {
                return Err(Error::Configuration(
                    "api_base_url must include http:// or https://".into(),
                ))
            }
            None => None,
        };
        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.sync_interval_secs == 0 {
            return Err(Error::Configuration(
                "sync_interval_secs must be greater than zero".into(),
            ));
        }
        self.target_language = normalize_text_option(Some(self.target_language))
            .unwrap_or_else(default_target_language);
        Ok(self)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub const fn initial_sync_delay(&self) -> Duration {
        Duration::from_millis(self.initial_sync_delay_ms)
    }

    /// Configured data directory, else the platform data dir.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("wordbook")))
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    normalize_text_option(lookup(key))
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| Error::Configuration(format!("{key} must be a whole number")))
        })
        .transpose()
}
