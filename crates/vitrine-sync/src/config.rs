//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     API_BASE_URL=https://tga.example.com                               │
//! │     API_KEY=...                                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $VITRINE_SYNC_CONFIG, or                                           │
//! │     ~/.config/vitrine/sync.toml (Linux)                                │
//! │     ~/Library/Application Support/com.vitrine.vitrine/sync.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing credentials are not a load error. The process still serves
//! searches from whatever is already mirrored; each sync cycle fails
//! before touching the network until both are set.
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [upstream]
//! base_url = "https://tga.example.com"
//! api_key = "secret"
//! page_size = 100
//!
//! [retry]
//! max_attempts = 3
//! delay_ms = 5000
//! strategy = "fixed"  # fixed | exponential
//!
//! [schedule]
//! interval_secs = 1800
//! run_on_start = true
//! history_retention_days = 30
//!
//! [search]
//! fuzzy_threshold = 0.3
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use vitrine_core::scoring::{ScoringParams, DEFAULT_FUZZY_THRESHOLD};

use crate::error::{SyncError, SyncResult};

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "VITRINE_SYNC_CONFIG";

// =============================================================================
// Upstream Settings
// =============================================================================

/// Where the inventory API lives and how to page through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL, e.g. `https://tga.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Value sent in the `X-API-Key` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Records requested per page (`limit`).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_products_path")]
    pub products_path: String,

    #[serde(default = "default_groups_path")]
    pub groups_path: String,

    /// Field holding the product code, also sent as `fields=` when only
    /// codes are needed.
    #[serde(default = "default_code_field")]
    pub product_code_field: String,

    /// Hard stop for upstreams that ignore `page` and repeat themselves.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_page_size() -> u32 {
    100
}
fn default_timeout() -> u64 {
    30
}
fn default_products_path() -> String {
    "/v1/produtos".to_string()
}
fn default_groups_path() -> String {
    "/v1/grupos".to_string()
}
fn default_code_field() -> String {
    "CODPRD".to_string()
}
fn default_max_pages() -> u32 {
    10_000
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        UpstreamSettings {
            base_url: None,
            api_key: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            products_path: default_products_path(),
            groups_path: default_groups_path(),
            product_code_field: default_code_field(),
            max_pages: default_max_pages(),
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Shape of the delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Same delay before every retry.
    #[default]
    Fixed,

    /// Delay doubles after each failure.
    Exponential,
}

impl std::fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryStrategy::Fixed => write!(f, "fixed"),
            RetryStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

impl std::str::FromStr for RetryStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" | "constant" => Ok(RetryStrategy::Fixed),
            "exponential" => Ok(RetryStrategy::Exponential),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown retry strategy: '{}'. Valid options: fixed, exponential",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_delay")]
    pub delay_ms: u64,

    #[serde(default)]
    pub strategy: RetryStrategy,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_delay() -> u64 {
    5_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay(),
            strategy: RetryStrategy::default(),
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// =============================================================================
// Schedule Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Seconds between cycles.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run a cycle immediately at startup.
    #[serde(default = "default_true")]
    pub run_on_start: bool,

    /// Days of sync run history kept after each cycle.
    #[serde(default = "default_history_retention")]
    pub history_retention_days: u32,
}

fn default_interval() -> u64 {
    30 * 60
}
fn default_history_retention() -> u32 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            interval_secs: default_interval(),
            run_on_start: true,
            history_retention_days: default_history_retention(),
        }
    }
}

impl ScheduleSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// =============================================================================
// Search Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Trigram similarity a name must exceed to match fuzzily.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub upstream: UpstreamSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,

    #[serde(default)]
    pub search: SearchSettings,
}

/// Base URL and key, both present.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: Url,
    pub api_key: String,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$VITRINE_SYNC_CONFIG`, or the
    ///    platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if let Some(ref base_url) = self.upstream.base_url {
            parse_base_url(base_url)?;
        }

        if self.upstream.page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        if self.upstream.max_pages == 0 {
            return Err(SyncError::InvalidConfig(
                "max_pages must be greater than 0".into(),
            ));
        }

        if self.upstream.product_code_field.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "product_code_field must not be empty".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(SyncError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }

        if self.schedule.interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "interval_secs must be greater than 0".into(),
            ));
        }

        if self.schedule.history_retention_days == 0 {
            return Err(SyncError::InvalidConfig(
                "history_retention_days must be at least 1".into(),
            ));
        }

        self.scoring_params()?;

        Ok(())
    }

    /// Applies process environment overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by env var name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            debug!(url = %url, "Overriding upstream URL from environment");
            self.upstream.base_url = Some(url);
        }

        if let Some(key) = lookup("API_KEY").filter(|v| !v.trim().is_empty()) {
            self.upstream.api_key = Some(key);
        }

        if let Some(size) = lookup("VITRINE_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(n) => self.upstream.page_size = n,
                Err(_) => warn!(value = %size, "Ignoring invalid VITRINE_PAGE_SIZE"),
            }
        }

        if let Some(secs) = lookup("VITRINE_SYNC_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(n) => {
                    debug!(interval_secs = n, "Overriding sync interval from environment");
                    self.schedule.interval_secs = n;
                }
                Err(_) => warn!(value = %secs, "Ignoring invalid VITRINE_SYNC_INTERVAL_SECS"),
            }
        }

        if let Some(ms) = lookup("VITRINE_RETRY_DELAY_MS") {
            match ms.parse::<u64>() {
                Ok(n) => self.retry.delay_ms = n,
                Err(_) => warn!(value = %ms, "Ignoring invalid VITRINE_RETRY_DELAY_MS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "vitrine", "vitrine")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the upstream credentials, or which one is missing.
    pub fn credentials(&self) -> SyncResult<Credentials> {
        let base_url = self
            .upstream
            .base_url
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(SyncError::MissingCredentials("API_BASE_URL"))?;
        let api_key = self
            .upstream
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(SyncError::MissingCredentials("API_KEY"))?;

        Ok(Credentials {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
        })
    }

    /// Scoring parameters for the search side.
    pub fn scoring_params(&self) -> SyncResult<ScoringParams> {
        ScoringParams::new(self.search.fuzzy_threshold)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))
    }
}

fn parse_base_url(raw: &str) -> SyncResult<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SyncError::InvalidUrl(format!(
            "Upstream URL must use http or https, got: {}",
            other
        ))),
    }
}
