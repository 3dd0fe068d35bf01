//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use url::Url;

use crate::client::{ApiVersion, ClientConfig};
use crate::transport::BackoffPolicy;

use super::cli::{Cli, Command};
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Where a webhook payload is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// Standard input
    Stdin,
    /// A file
    File(PathBuf),
}

impl fmt::Display for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The operation to run, with everything it needs.
#[derive(Debug)]
pub enum Action {
    /// Write the default config template.
    Init {
        /// Destination file
        output: PathBuf,
    },

    /// Run a GROQ query.
    Query {
        /// Client settings
        client: ClientConfig,
        /// The GROQ query
        query: String,
        /// Parameters in command-line order
        params: Vec<(String, serde_json::Value)>,
    },

    /// Fetch documents by ID.
    Get {
        /// Client settings
        client: ClientConfig,
        /// Document IDs
        ids: Vec<String>,
    },

    /// Verify a signature header.
    Verify {
        /// Webhook secret
        secret: String,
        /// Header value to check
        signature: String,
        /// Payload source
        body: BodySource,
    },

    /// Produce a signature header.
    Sign {
        /// Webhook secret
        secret: String,
        /// Fixed signing time, or now
        timestamp: Option<u64>,
        /// Payload source
        body: BodySource,
    },
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// The operation to run
    pub action: Action,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Action::Query { client, params, .. } => write!(
                f,
                "Config {{ action: query, project: {}, dataset: {}, api_version: {}, cdn: {}, params: {} }}",
                client.project_id,
                client.dataset,
                client.api_version,
                client.use_cdn,
                params.len(),
            ),
            Action::Get { client, ids } => write!(
                f,
                "Config {{ action: get, project: {}, dataset: {}, api_version: {}, ids: {} }}",
                client.project_id,
                client.dataset,
                client.api_version,
                ids.len(),
            ),
            Action::Init { output } => {
                write!(f, "Config {{ action: init, output: {} }}", output.display())
            }
            Action::Verify { body, .. } => write!(f, "Config {{ action: verify, body: {body} }}"),
            Action::Sign { body, timestamp, .. } => write!(
                f,
                "Config {{ action: sign, body: {body}, timestamp: {} }}",
                timestamp.map_or_else(|| "now".to_string(), |t| t.to_string()),
            ),
        }
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing (`project` for query/get, `secret` for sign/verify)
    /// - The API version, host, headers or parameters are invalid
    /// - The retry settings are inconsistent
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let action = match &cli.command {
            Command::Query { query, params } => Action::Query {
                client: Self::build_client(cli, toml)?,
                query: query.clone(),
                params: params
                    .iter()
                    .map(String::as_str)
                    .map(parse_param)
                    .collect::<Result<_, _>>()?,
            },
            Command::Get { ids } => Action::Get {
                client: Self::build_client(cli, toml)?,
                ids: ids.clone(),
            },
            Command::Verify {
                signature,
                secret,
                body_file,
            } => Action::Verify {
                secret: Self::resolve_secret(secret.as_deref(), toml)?,
                signature: signature.clone(),
                body: body_source(body_file.as_deref()),
            },
            Command::Sign {
                secret,
                timestamp,
                body_file,
            } => Action::Sign {
                secret: Self::resolve_secret(secret.as_deref(), toml)?,
                timestamp: *timestamp,
                body: body_source(body_file.as_deref()),
            },
            Command::Init { output } => Action::Init {
                output: output
                    .as_deref()
                    .map(expand_path)
                    .or_else(defaults::config_path)
                    .unwrap_or_else(|| PathBuf::from(defaults::CONFIG_FILE_NAME)),
            },
        };

        Ok(Self {
            action,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// Uses `cli.config` if set, otherwise the default config file when it exists.
    /// The `init` command never reads a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        if cli.is_init() {
            return Self::from_raw(cli, None);
        }

        let toml = match Self::config_file(cli) {
            Some(path) => Some(TomlConfig::load(&path)?),
            None => None,
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn config_file(cli: &Cli) -> Option<PathBuf> {
        if let Some(ref path) = cli.config {
            return Some(expand_path(path));
        }

        defaults::config_path().filter(|path| path.is_file())
    }

    fn build_client(cli: &Cli, toml: Option<&TomlConfig>) -> Result<ClientConfig, ConfigError> {
        let project = toml.map(|t| &t.project);

        let project_id = cli
            .project
            .as_deref()
            .or_else(|| project.and_then(|p| p.id.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(
                    field::PROJECT,
                    "Use --project or set project.id in config file",
                )
            })?;

        // Priority: CLI explicit > TOML > default
        let dataset = cli
            .dataset
            .as_deref()
            .or_else(|| project.and_then(|p| p.dataset.as_deref()))
            .unwrap_or(defaults::DATASET);

        let mut config = ClientConfig::new(project_id, dataset)
            .with_cdn(cli.cdn || project.is_some_and(|p| p.use_cdn))
            .with_backoff(Self::build_backoff(toml)?);

        if let Some(version) = cli
            .api_version
            .as_deref()
            .or_else(|| project.and_then(|p| p.api_version.as_deref()))
        {
            config = config
                .with_api_version(ApiVersion::parse(version).map_err(ConfigError::InvalidClient)?);
        }

        if let Some(host) = cli
            .host
            .as_deref()
            .or_else(|| project.and_then(|p| p.host.as_deref()))
        {
            let url = Url::parse(host).map_err(|e| ConfigError::InvalidUrl {
                url: host.to_string(),
                reason: e.to_string(),
            })?;
            config = config.with_api_host(url);
        }

        if let Some(token) = cli
            .token
            .as_deref()
            .or_else(|| project.and_then(|p| p.token.as_deref()))
        {
            config = config.with_token(token);
        }

        if let Some(tag) = cli
            .tag
            .as_deref()
            .or_else(|| project.and_then(|p| p.tag.as_deref()))
        {
            config = config.with_tag(tag);
        }

        for (name, value) in &Self::resolve_headers(cli, toml)? {
            config = config.with_header(name.clone(), value.clone());
        }

        config.validate().map_err(ConfigError::InvalidClient)?;
        Ok(config)
    }

    fn resolve_headers(cli: &Cli, toml: Option<&TomlConfig>) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        // Add TOML headers first (CLI can override)
        if let Some(toml) = toml {
            for (name, value) in &toml.project.headers {
                let header_name = parse_header_name(name)?;
                let header_value = parse_header_value(name, value)?;
                headers.insert(header_name, header_value);
            }
        }

        // Add CLI headers (override TOML)
        for header_str in &cli.headers {
            let (name, value) = parse_header_string(header_str)?;
            let header_name = parse_header_name(&name)?;
            let header_value = parse_header_value(&name, &value)?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    fn build_backoff(toml: Option<&TomlConfig>) -> Result<BackoffPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        let min_delay_ms = retry
            .and_then(|r| r.min_delay_ms)
            .unwrap_or(defaults::RETRY_MIN_DELAY_MS);

        let max_delay_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::RETRY_MAX_DELAY_MS);

        let factor = retry
            .and_then(|r| r.factor)
            .unwrap_or(defaults::RETRY_FACTOR);

        let jitter = retry.and_then(|r| r.jitter).unwrap_or(true);
        let max_attempts = retry.and_then(|r| r.max_attempts);

        if factor <= 0.0 || !factor.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "factor must be a positive finite number".to_string(),
            ));
        }

        if max_delay_ms < min_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({max_delay_ms}) must be >= min_delay_ms ({min_delay_ms})"
            )));
        }

        let mut policy = BackoffPolicy::new()
            .with_min_delay(Duration::from_millis(min_delay_ms))
            .with_max_delay(Duration::from_millis(max_delay_ms))
            .with_factor(factor)
            .with_jitter(jitter);

        if let Some(max_attempts) = max_attempts {
            if max_attempts == 0 {
                return Err(ConfigError::InvalidRetry(
                    "max_attempts must be greater than 0".to_string(),
                ));
            }
            policy = policy.with_max_attempts(max_attempts);
        }

        Ok(policy)
    }

    fn resolve_secret(cli: Option<&str>, toml: Option<&TomlConfig>) -> Result<String, ConfigError> {
        cli.or_else(|| toml.and_then(|t| t.webhook.secret.as_deref()))
            .filter(|secret| !secret.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| {
                ConfigError::missing(
                    field::SECRET,
                    "Use --secret or set webhook.secret in config file",
                )
            })
    }
}

/// Writes the default configuration template to a file.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_error = |e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(write_error)
}

/// Expands a leading `~/` to the user's home directory.
#[must_use]
pub fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

// Helper functions

fn body_source(path: Option<&Path>) -> BodySource {
    path.map_or(BodySource::Stdin, |p| BodySource::File(expand_path(p)))
}

fn parse_param(s: &str) -> Result<(String, serde_json::Value), ConfigError> {
    let (name, value) = s.split_once('=').ok_or_else(|| ConfigError::InvalidParam {
        value: s.to_string(),
        reason: "expected 'name=<json>'".to_string(),
    })?;

    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return Err(ConfigError::InvalidParam {
            value: s.to_string(),
            reason: "parameter name is empty".to_string(),
        });
    }

    let value = serde_json::from_str(value).map_err(|e| ConfigError::InvalidParam {
        value: s.to_string(),
        reason: e.to_string(),
    })?;

    Ok((name.to_string(), value))
}

fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    // Try "Key=Value" format first
    if let Some((name, value)) = s.split_once('=') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    // Try "Key: Value" format
    if let Some((name, value)) = s.split_once(':') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    Err(ConfigError::InvalidHeader {
        value: s.to_string(),
    })
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
