//! core::config::schema
//!
//! Configuration schema types.
//!
//! Both scopes share the formatting keys; only the repo scope knows about
//! branches and remotes.
//!
//! # Validation
//!
//! Values are validated after parsing: `trunk` must be a valid branch name,
//! extensions must be bare suffixes, and the formatter command cannot be
//! empty.

use serde::Deserialize;

use super::ConfigError;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// style = "file"
/// extensions = ["c", "h", "cpp"]
/// binary = ["git", "clang-format"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Style passed to `--style` ("file" reads `.clang-format`)
    pub style: Option<String>,

    /// File extensions the formatter may touch
    pub extensions: Option<Vec<String>>,

    /// Command words that start the formatter
    pub binary: Option<Vec<String>>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.format().validate()
    }

    /// The formatter settings of this scope.
    pub fn format(&self) -> FormatConfig {
        FormatConfig {
            style: self.style.clone(),
            extensions: self.extensions.clone(),
            binary: self.binary.clone(),
        }
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// trunk = "main"
/// remote = "origin"
/// upstream = "origin/main"
/// style = "file"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Protected default branch; `rewrite-branch` refuses to run on it
    pub trunk: Option<String>,

    /// Remote tracking the default branch (default: "origin")
    pub remote: Option<String>,

    /// Explicit upstream revision the branch is compared against
    pub upstream: Option<String>,

    /// Style override for this repository
    pub style: Option<String>,

    /// Extension override for this repository
    pub extensions: Option<Vec<String>>,

    /// Formatter command override for this repository
    pub binary: Option<Vec<String>>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trunk) = &self.trunk {
            BranchName::new(trunk).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid trunk branch name: {}", e))
            })?;
        }

        if matches!(&self.remote, Some(remote) if remote.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "remote cannot be empty".to_string(),
            ));
        }

        if matches!(&self.upstream, Some(upstream) if upstream.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "upstream cannot be empty".to_string(),
            ));
        }

        self.format().validate()
    }

    /// The formatter settings of this scope.
    pub fn format(&self) -> FormatConfig {
        FormatConfig {
            style: self.style.clone(),
            extensions: self.extensions.clone(),
            binary: self.binary.clone(),
        }
    }
}

/// Formatter settings, valid in both scopes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatConfig {
    /// Style passed to `--style` ("file" reads `.clang-format`)
    pub style: Option<String>,

    /// File extensions the formatter may touch
    pub extensions: Option<Vec<String>>,

    /// Command words that start the formatter
    pub binary: Option<Vec<String>>,
}

impl FormatConfig {
    /// Validate the formatter settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(&self.style, Some(style) if style.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "style cannot be empty".to_string(),
            ));
        }

        if let Some(extensions) = &self.extensions {
            if extensions.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "extensions cannot be an empty list".to_string(),
                ));
            }
            for ext in extensions {
                crate::format::Extensions::check(ext).map_err(ConfigError::InvalidValue)?;
            }
        }

        if let Some(binary) = &self.binary {
            if binary.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "binary must name a program".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Overlay `other` on top of `self`, field by field.
    pub fn merged_with(&self, other: &FormatConfig) -> FormatConfig {
        FormatConfig {
            style: other.style.clone().or_else(|| self.style.clone()),
            extensions: other.extensions.clone().or_else(|| self.extensions.clone()),
            binary: other.binary.clone().or_else(|| self.binary.clone()),
        }
    }
}
