//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::site::retry::RetryPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing search URL; pages are requested as `{base_url}?page={n}`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bucket receiving raw pages (input of extraction)
    #[serde(default = "default_landing_bucket")]
    pub landing_bucket: String,

    /// Bucket receiving the consolidated report
    #[serde(default = "default_final_bucket")]
    pub final_bucket: String,

    /// Root directory of the local blob store
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// Number of pages fetched per run, starting at 1
    #[serde(default = "default_page_count")]
    pub page_count: u32,

    /// Attempts per page before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff time unit in milliseconds (delay after attempt n is unit * 2^n)
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    /// Report field delimiter
    #[serde(default)]
    pub delimiter: Delimiter,
}

fn default_base_url() -> String {
    "https://casas.mitula.com.co/casas/bogota".to_string()
}

fn default_landing_bucket() -> String {
    "landing-casas-c".to_string()
}

fn default_final_bucket() -> String {
    "zappa-casas-oo-1000".to_string()
}

fn default_store_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_page_count() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_referer() -> String {
    "https://www.google.com/".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            landing_bucket: default_landing_bucket(),
            final_bucket: default_final_bucket(),
            store_root: default_store_root(),
            page_count: default_page_count(),
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            delimiter: Delimiter::Comma,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("listings-pipeline").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("LISTINGS_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }

        if let Ok(bucket) = std::env::var("LISTINGS_LANDING_BUCKET") {
            if !bucket.trim().is_empty() {
                self.landing_bucket = bucket;
            }
        }

        if let Ok(bucket) = std::env::var("LISTINGS_FINAL_BUCKET") {
            if !bucket.trim().is_empty() {
                self.final_bucket = bucket;
            }
        }

        if let Ok(root) = std::env::var("LISTINGS_STORE_ROOT") {
            if !root.trim().is_empty() {
                self.store_root = PathBuf::from(root);
            }
        }

        if let Ok(delimiter) = std::env::var("LISTINGS_DELIMITER") {
            if let Ok(d) = delimiter.parse() {
                self.delimiter = d;
            }
        }

        self
    }

    /// Retry policy for page fetching.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_unit_ms))
    }
}

/// Field delimiter of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
        }
    }
}

impl std::str::FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            _ => Err(format!("Unknown delimiter: {}. Use: comma, semicolon", s)),
        }
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Semicolon => write!(f, "semicolon"),
        }
    }
}
