//! Configuration layer for the `sanity` command-line tool.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`], [`Action`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The config file is `--config` if given, otherwise
//! `<config dir>/sanity-client/config.toml` when that file exists.
//!
//! Headers from the CLI replace TOML headers of the same name; other TOML
//! headers are kept.
//!
//! # Boolean Flag Semantics
//!
//! `--cdn` uses OR semantics: if set `true` in either CLI or TOML, the
//! result is `true`.
//!
//! # TOML-Only Options
//!
//! Backoff tuning (`[retry]`) is only available through the config file.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{Action, BodySource, ValidatedConfig, expand_path, write_default_config};
