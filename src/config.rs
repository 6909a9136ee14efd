//! Configuration file parser for `fb2disqus.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. `FACEBOOK_APP_ID` and `FACEBOOK_APP_SECRET`
//! take precedence over the file.
use secrecy::SecretString;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::disqus::DateFormat;
use crate::facebook::{DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT_REQUESTS};

pub const APP_ID_ENV: &str = "FACEBOOK_APP_ID";
pub const APP_SECRET_ENV: &str = "FACEBOOK_APP_SECRET";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// Custom Debug impl masks `app_secret`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Facebook app id.
    pub app_id: Option<String>,

    /// Facebook app secret.
    pub app_secret: Option<String>,

    /// Tab-separated page descriptor file.
    pub input_file_path: PathBuf,

    /// Folder that receives one `<title>.xml` per page.
    pub output_path: PathBuf,

    /// Graph API root. Must be HTTPS outside of local testing.
    pub graph_api_base_url: String,

    /// Reply pages fetched concurrently within one level. 1 = sequential.
    pub max_concurrent_requests: usize,

    /// Transport timeout for each HTTP request, in seconds.
    pub request_timeout_secs: u64,

    /// `"iso"` or `"legacy"`, see [`DateFormat`].
    pub date_format: DateFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            input_file_path: PathBuf::from("pages.tsv"),
            output_path: PathBuf::from("."),
            graph_api_base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: 30,
            date_format: DateFormat::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[REDACTED]"))
            .field("input_file_path", &self.input_file_path)
            .field("output_path", &self.output_path)
            .field("graph_api_base_url", &self.graph_api_base_url)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("date_format", &self.date_format)
            .finish()
    }
}

/// App id and secret after environment overrides.
///
/// Either may be empty; the client rejects blank values before any request.
pub struct Credentials {
    pub app_id: String,
    pub app_secret: SecretString,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "app_id",
        "app_secret",
        "input_file_path",
        "output_path",
        "graph_api_base_url",
        "max_concurrent_requests",
        "request_timeout_secs",
        "date_format",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file gives the defaults. Unknown keys are logged
    /// and otherwise ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_capped(path)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let table: toml::Table = toml::from_str(&content)?;
        table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
            .for_each(|key| tracing::warn!(key = %key, "Unknown key in config file, ignoring"));

        let config: Config = toml::Value::Table(table).try_into()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reads at most one byte past the limit, so an oversized file is
    /// detected without loading all of it.
    fn read_capped(path: &Path) -> Result<Option<String>, ConfigError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} exceeds {} bytes",
                path.display(),
                Self::MAX_FILE_SIZE
            )));
        }
        Ok(Some(content))
    }

    /// Resolves credentials, preferring the environment over the file.
    pub fn credentials(&self) -> Credentials {
        self.credentials_from(|key| std::env::var(key).ok())
    }

    fn credentials_from(&self, env: impl Fn(&str) -> Option<String>) -> Credentials {
        let app_id = env(APP_ID_ENV)
            .or_else(|| self.app_id.clone())
            .unwrap_or_default();
        let app_secret = env(APP_SECRET_ENV)
            .or_else(|| self.app_secret.clone())
            .unwrap_or_default();
        Credentials {
            app_id,
            app_secret: SecretString::from(app_secret),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
