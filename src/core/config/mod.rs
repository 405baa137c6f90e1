//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! branchfmt has two configuration scopes:
//! - **Global**: User-level formatter defaults
//! - **Repo**: Repository-level settings and overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$BRANCHFMT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/branchfmt/config.toml`
//! 3. `~/.branchfmt/config.toml`
//!
//! # Repo Config Location
//!
//! `<git-dir>/branchfmt/config.toml`. The git dir is passed in rather than
//! derived from the working directory so linked worktrees find the config
//! of their main repository.
//!
//! # Example
//!
//! ```no_run
//! use branchfmt::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Style: {}", config.style());
//! ```

pub mod schema;

pub use schema::{FormatConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions handed to the formatter when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "hxx", "m", "mm", "inc",
];

/// Formatter command used when none is configured.
pub const DEFAULT_BINARY: &[&str] = &["git", "clang-format"];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically: repo config overrides global
/// config, which overrides the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo and present)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads the repository config stored
    /// inside it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<Config, ConfigError> {
        let (global, global_path) = match Self::global_candidates()
            .into_iter()
            .find(|path| path.exists())
        {
            Some(path) => (Self::read_toml::<GlobalConfig>(&path)?, Some(path)),
            None => (GlobalConfig::default(), None),
        };

        let (repo, repo_path) = match git_dir.map(Self::repo_config_path) {
            Some(path) if path.exists() => (Some(Self::read_toml::<RepoConfig>(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        tracing::debug!(
            global = ?global_path,
            repo = ?repo_path,
            "configuration loaded"
        );

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Build a configuration from already parsed scopes.
    pub fn new(global: GlobalConfig, repo: Option<RepoConfig>) -> Config {
        Config {
            global,
            repo,
            global_path: None,
            repo_path: None,
        }
    }

    /// Global config files in search order.
    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("BRANCHFMT_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("branchfmt/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".branchfmt/config.toml"));
        }
        candidates
    }

    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for repo config.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("branchfmt/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Configured protected default branch, if any.
    ///
    /// `None` means it is detected from the remote.
    pub fn trunk(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.trunk.as_deref())
    }

    /// Remote name, "origin" unless configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or("origin")
    }

    /// Explicit upstream revision, if configured.
    pub fn upstream(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.upstream.as_deref())
    }

    /// Formatter settings with repo values layered over global ones.
    fn format(&self) -> FormatConfig {
        let global = self.global.format();
        match &self.repo {
            Some(repo) => global.merged_with(&repo.format()),
            None => global,
        }
    }

    /// Style passed to the formatter, "file" unless configured.
    pub fn style(&self) -> String {
        self.format().style.unwrap_or_else(|| "file".to_string())
    }

    /// Extensions passed to the formatter.
    pub fn extensions(&self) -> Vec<String> {
        self.format().extensions.unwrap_or_else(|| {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        })
    }

    /// Command words that start the formatter.
    pub fn binary(&self) -> Vec<String> {
        self.format()
            .binary
            .unwrap_or_else(|| DEFAULT_BINARY.iter().map(|w| w.to_string()).collect())
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_repo_config(git_dir: &Path, contents: &str) {
        let path = Config::repo_config_path(git_dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_without_repo_config() {
        let config = Config::default();

        assert!(config.trunk().is_none());
        assert!(config.upstream().is_none());
        assert_eq!(config.remote(), "origin");
        assert_eq!(config.style(), "file");
        assert_eq!(config.binary(), vec!["git", "clang-format"]);
        assert!(config.extensions().contains(&"cpp".to_string()));
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "style = \"webkit\"\n").unwrap();

        std::env::set_var("BRANCHFMT_CONFIG", config_path.to_str().unwrap());
        let config = Config::load(None).unwrap();
        std::env::remove_var("BRANCHFMT_CONFIG");

        assert_eq!(config.style(), "webkit");
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        write_repo_config(
            temp.path(),
            r#"
            trunk = "main"
            remote = "upstream"
            extensions = ["c", "h"]
            "#,
        );

        let config = Config::load(Some(temp.path())).unwrap();

        assert_eq!(config.trunk(), Some("main"));
        assert_eq!(config.remote(), "upstream");
        assert_eq!(config.extensions(), vec!["c", "h"]);
        assert!(config.repo_config_loaded_from().is_some());
    }

    #[test]
    fn invalid_trunk_rejected() {
        let temp = TempDir::new().unwrap();
        write_repo_config(temp.path(), "trunk = \"invalid..name\"");

        assert!(Config::load(Some(temp.path())).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        write_repo_config(
            temp.path(),
            r#"
            trunk = "main"
            unknown_field = true
            "#,
        );

        let result = Config::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn repo_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                style: Some("google".to_string()),
                binary: Some(vec!["clang-format-wrapper".to_string()]),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                style: Some("llvm".to_string()),
                ..Default::default()
            }),
            global_path: None,
            repo_path: None,
        };

        assert_eq!(config.style(), "llvm");
        assert_eq!(config.binary(), vec!["clang-format-wrapper"]);
    }
}
