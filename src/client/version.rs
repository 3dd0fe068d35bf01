//! API version tokens.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(1|X|[0-9]{4}-[0-9]{2}-[0-9]{2})$").expect("version pattern is valid")
});

/// A validated API version.
///
/// Versions are ISO dates (`2021-03-25`), `1` for the original API, or
/// `X` for experimental features. The version becomes the `/v<version>`
/// path prefix of every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Version 1, the initial released version.
    pub const V1: &'static str = "1";

    /// The experimental version.
    pub const EXPERIMENTAL: &'static str = "X";

    /// The 2021-03-25 release.
    pub const V2021_03_25: &'static str = "2021-03-25";

    /// Parses and validates a version string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the version is empty or does not
    /// match `1`, `X`, or `YYYY-MM-DD`.
    pub fn parse(version: &str) -> Result<Self, Error> {
        validate(version)?;
        Ok(Self(version.to_string()))
    }

    /// Returns version 1.
    #[must_use]
    pub fn v1() -> Self {
        Self(Self::V1.to_string())
    }

    /// Returns the experimental version.
    #[must_use]
    pub fn experimental() -> Self {
        Self(Self::EXPERIMENTAL.to_string())
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path prefix for this version, e.g. `/v2021-03-25`.
    #[must_use]
    pub fn path_prefix(&self) -> String {
        format!("/v{}", self.0)
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self(Self::V2021_03_25.to_string())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Checks a version string without constructing an [`ApiVersion`].
///
/// # Errors
///
/// Returns [`Error::Validation`] describing why the version is invalid.
pub fn validate(version: &str) -> Result<(), Error> {
    if version.is_empty() {
        return Err(Error::validation("no version given"));
    }

    if !VERSION_PATTERN.is_match(version) {
        return Err(Error::validation(format!(
            "invalid version format {version:?}"
        )));
    }

    Ok(())
}
