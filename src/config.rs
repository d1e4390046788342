//! Workflow configuration
//!
//! Resolution priority: command-line argument (highest), environment
//! variable, TOML config file, compiled default. CLI and environment are
//! handled together by clap in the binary; this module supplies the
//! defaults, the optional file layer, and the merge.

use crate::services::semantic_scholar::DEFAULT_BASE_URL;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_README: &str = "README.md";
pub const DEFAULT_STORE: &str = "citations.json";
pub const DEFAULT_CONFIG_FILE: &str = "citesync.toml";
pub const DEFAULT_FRESHNESS_HOURS: u64 = 24;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Fully resolved workflow configuration
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Markdown catalog document
    pub readme: PathBuf,
    /// Persisted citation store
    pub store: PathBuf,
    /// Semantic Scholar Graph API base URL
    pub api_base_url: String,
    /// Records updated within this many hours are skipped
    pub freshness_hours: u64,
    /// Delay between API requests, also the retry delay
    pub request_delay_ms: u64,
    /// Search attempts per record
    pub retry_limit: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            readme: PathBuf::from(DEFAULT_README),
            store: PathBuf::from(DEFAULT_STORE),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            freshness_hours: DEFAULT_FRESHNESS_HOURS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

/// Optional TOML file layer; every field may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub readme: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub freshness_hours: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub retry_limit: Option<u32>,
}

impl TomlConfig {
    /// Load the config file if it exists. A missing file means "use
    /// defaults"; a malformed file is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }
}

/// CLI/environment overrides collected by the binary
#[derive(Debug, Default)]
pub struct Overrides {
    pub readme: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub freshness_hours: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub retry_limit: Option<u32>,
}

/// Merge the three layers into a validated configuration
pub fn resolve(file: TomlConfig, cli: Overrides) -> Result<WorkflowConfig> {
    let defaults = WorkflowConfig::default();
    let config = WorkflowConfig {
        readme: cli.readme.or(file.readme).unwrap_or(defaults.readme),
        store: cli.store.or(file.store).unwrap_or(defaults.store),
        api_base_url: cli
            .api_base_url
            .or(file.api_base_url)
            .unwrap_or(defaults.api_base_url),
        freshness_hours: cli
            .freshness_hours
            .or(file.freshness_hours)
            .unwrap_or(defaults.freshness_hours),
        request_delay_ms: cli
            .request_delay_ms
            .or(file.request_delay_ms)
            .unwrap_or(defaults.request_delay_ms),
        retry_limit: cli
            .retry_limit
            .or(file.retry_limit)
            .unwrap_or(defaults.retry_limit),
    };
    config.validate()?;
    Ok(config)
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.retry_limit == 0 {
            return Err(Error::Config("retry_limit must be at least 1".to_string()));
        }
        if self.request_delay_ms == 0 {
            return Err(Error::Config(
                "request_delay_ms must be non-zero to respect the API rate ceiling".to_string(),
            ));
        }
        if self.api_base_url.is_empty() {
            return Err(Error::Config("api_base_url must not be empty".to_string()));
        }
        Ok(())
    }
}
