//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sanity: query and inspect a document store from the command line
///
/// Runs GROQ queries, fetches documents by ID, and signs or verifies
/// webhook payloads.
#[derive(Debug, Parser)]
#[command(name = "sanity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Project ID (required for query and get)
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Dataset name
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// API version: 1, X, or a date such as 2021-03-25
    #[arg(long = "api-version", global = true)]
    pub api_version: Option<String>,

    /// API token sent as a bearer token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Send queries through the API CDN
    #[arg(long, global = true)]
    pub cdn: bool,

    /// Custom API host, e.g. `http://localhost:3333`
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// HTTP headers in 'Key=Value' or 'Key: Value' format (can be specified multiple times)
    #[arg(long = "header", value_name = "K=V", global = true)]
    pub headers: Vec<String>,

    /// Request tag
    #[arg(long, global = true)]
    pub tag: Option<String>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for sanity
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path (defaults to the user config directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Run a GROQ query and print the result as JSON
    Query {
        /// The GROQ query
        query: String,

        /// Query parameter as 'name=<json>' (can be specified multiple times)
        #[arg(long = "param", value_name = "NAME=JSON")]
        params: Vec<String>,
    },

    /// Fetch documents by ID and print them as JSON
    Get {
        /// Document IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Verify a webhook signature header against a payload
    Verify {
        /// Value of the `sanity-webhook-signature` header
        #[arg(long)]
        signature: String,

        /// Webhook secret
        #[arg(long)]
        secret: Option<String>,

        /// Read the payload from this file instead of stdin
        #[arg(long = "body-file")]
        body_file: Option<PathBuf>,
    },

    /// Print a signature header for a payload
    Sign {
        /// Webhook secret
        #[arg(long)]
        secret: Option<String>,

        /// Signing time in milliseconds since the Unix epoch (defaults to now)
        #[arg(long)]
        timestamp: Option<u64>,

        /// Read the payload from this file instead of stdin
        #[arg(long = "body-file")]
        body_file: Option<PathBuf>,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
