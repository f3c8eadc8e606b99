//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! There are two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
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
//! 1. `$CL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cl/config.toml`
//! 3. `~/.cl/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use clchain::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Upstream: {}", config.upstream());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig, ReviewDefaults};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::labels::PresubmitTest;
use crate::core::paths::ClPaths;
use crate::core::types::BranchName;

/// Default remote name.
pub const DEFAULT_REMOTE: &str = "origin";

/// Default upstream branch.
pub const DEFAULT_UPSTREAM: &str = "master";

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
/// Accessors apply precedence rules: repo config overrides global config,
/// which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `paths` is provided, also loads the repository config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// hold invalid values. Missing files are not an error.
    pub fn load(paths: Option<&ClPaths>) -> Result<Config, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path) = match paths {
            Some(paths) => {
                let path = paths.repo_config_path();
                if path.exists() {
                    (Some(read_toml::<RepoConfig>(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(global = ?global_path, repo = ?repo_path, "loaded config");

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        let candidates = global_candidates(|key| std::env::var(key).ok(), dirs::home_dir());
        for path in candidates {
            if path.exists() {
                let config = read_toml::<GlobalConfig>(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((GlobalConfig::default(), None))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Remote name. Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Upstream branch name. Defaults to "master".
    pub fn upstream(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.upstream.as_deref())
            .unwrap_or(DEFAULT_UPSTREAM)
    }

    /// Upstream as a validated branch name.
    pub fn upstream_branch(&self) -> Result<BranchName, ConfigError> {
        BranchName::new(self.upstream())
            .map_err(|e| ConfigError::InvalidValue(format!("invalid upstream: {}", e)))
    }

    /// Check if interactive mode is enabled by default. Defaults to `true`.
    pub fn interactive(&self) -> bool {
        self.global.interactive.unwrap_or(true)
    }

    /// User name for default topics: configured `user`, else `$USER`.
    pub fn user(&self) -> Option<String> {
        self.global
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .filter(|u| !u.is_empty())
    }

    fn review_value<T: Clone>(&self, pick: impl Fn(&ReviewDefaults) -> Option<T>) -> Option<T> {
        self.repo
            .as_ref()
            .and_then(|r| r.review.as_ref())
            .and_then(&pick)
            .or_else(|| self.global.review.as_ref().and_then(&pick))
    }

    pub fn review_host(&self) -> Option<String> {
        self.review_value(|r| r.host.clone())
    }

    pub fn reviewers(&self) -> Vec<String> {
        self.review_value(|r| r.reviewers.clone()).unwrap_or_default()
    }

    pub fn ccs(&self) -> Vec<String> {
        self.review_value(|r| r.ccs.clone()).unwrap_or_default()
    }

    /// Defaults to `false`.
    pub fn draft(&self) -> bool {
        self.review_value(|r| r.draft).unwrap_or(false)
    }

    /// Defaults to [`PresubmitTest::All`].
    pub fn presubmit(&self) -> PresubmitTest {
        self.review_value(|r| r.presubmit.clone()).unwrap_or_default()
    }

    /// Defaults to `true`.
    pub fn set_topic(&self) -> bool {
        self.review_value(|r| r.set_topic).unwrap_or(true)
    }

    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

/// Global config search order for the given environment.
fn global_candidates(
    env: impl Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = env("CL_CONFIG") {
        candidates.push(PathBuf::from(path));
    }
    if let Some(xdg) = env("XDG_CONFIG_HOME") {
        candidates.push(PathBuf::from(xdg).join("cl/config.toml"));
    }
    if let Some(home) = home {
        candidates.push(home.join(".cl/config.toml"));
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
