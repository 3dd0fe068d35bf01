//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::path::PathBuf;

use crate::transport::BackoffPolicy;

/// Default dataset name.
pub const DATASET: &str = crate::client::DEFAULT_DATASET;

/// Directory under the platform config dir holding the config file.
pub const CONFIG_DIR_NAME: &str = "sanity-client";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default minimum retry delay in milliseconds.
pub const RETRY_MIN_DELAY_MS: u64 = 100;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;

/// Default retry backoff factor.
pub const RETRY_FACTOR: f64 = BackoffPolicy::DEFAULT_FACTOR;

/// Default location of the config file, if the platform has a config dir.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
