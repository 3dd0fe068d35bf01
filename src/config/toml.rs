//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Project and connection settings
    #[serde(default)]
    pub project: ProjectSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Webhook signing configuration
    #[serde(default)]
    pub webhook: WebhookSection,
}

/// Project configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Project ID
    pub id: Option<String>,

    /// Dataset name (default: production)
    pub dataset: Option<String>,

    /// API version
    pub api_version: Option<String>,

    /// API token
    pub token: Option<String>,

    /// Send queries through the API CDN
    #[serde(default)]
    pub use_cdn: bool,

    /// Custom API host
    pub host: Option<String>,

    /// Default request tag
    pub tag: Option<String>,

    /// HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Delay before the first retry in milliseconds
    pub min_delay_ms: Option<u64>,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff factor
    pub factor: Option<f64>,

    /// Randomize delays
    pub jitter: Option<bool>,

    /// Maximum number of attempts, including the first (default: unlimited)
    pub max_attempts: Option<u32>,
}

/// Webhook configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    /// Shared webhook secret
    pub secret: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Sanity client configuration file

[project]
# Project ID (required for query and get)
# id = "abc123"

# Dataset name (default: production)
# dataset = "production"

# API version: 1, X, or a release date (default: 2021-03-25)
# api_version = "2021-03-25"

# API token sent as a bearer token
# token = "your-token-here"

# Send queries through the API CDN (mutations and document fetches never are)
# use_cdn = false

# Custom API host, replacing both the API and CDN hosts
# host = "http://localhost:3333"

# Default request tag
# tag = "cli"

# Extra HTTP headers
# [project.headers]
# X-Custom-Header = "value"

[retry]
# Only GET/HEAD/DELETE/OPTIONS requests answered with 408, 503 or 504 are retried.

# Delay before the first retry in milliseconds (default: 100)
# min_delay_ms = 100

# Maximum delay between retries in milliseconds (default: 10000)
# max_delay_ms = 10000

# Backoff factor (default: 2.0)
# factor = 2.0

# Randomize delays (default: true)
# jitter = true

# Maximum number of attempts, including the first (default: unlimited)
# max_attempts = 5

[webhook]
# Shared secret for the sign and verify commands
# secret = "your-webhook-secret"
"#
    .to_string()
}
