//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$CL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cl/config.toml`
//! 3. `~/.cl/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `<git-dir>/cl/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., upstream must be a valid branch name).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::labels::PresubmitTest;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// user = "alice"
/// interactive = true
///
/// [review]
/// host = "https://review.example.com"
/// reviewers = ["bob@example.com"]
/// presubmit = "none"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// User name used in default topics (falls back to `$USER`)
    pub user: Option<String>,

    /// Default interactive mode
    pub interactive: Option<bool>,

    /// Review defaults
    pub review: Option<ReviewDefaults>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(user) = &self.user {
            if user.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "user cannot be empty".to_string(),
                ));
            }
        }

        if let Some(review) = &self.review {
            review.validate()?;
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// upstream = "main"
///
/// [review]
/// draft = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Upstream branch changes are reviewed against (default: "master")
    pub upstream: Option<String>,

    /// Review defaults overriding the global ones
    pub review: Option<ReviewDefaults>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(upstream) = &self.upstream {
            BranchName::new(upstream).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid upstream branch name: {}", e))
            })?;
        }

        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        if let Some(review) = &self.review {
            review.validate()?;
        }

        Ok(())
    }
}

/// Defaults for `cl mail`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewDefaults {
    /// Review server base URL, used for the topic REST call
    pub host: Option<String>,

    /// Default reviewers
    pub reviewers: Option<Vec<String>>,

    /// Default CCs
    pub ccs: Option<Vec<String>>,

    /// Upload as draft
    pub draft: Option<bool>,

    /// Presubmit type ("all", "none" or a named profile)
    pub presubmit: Option<PresubmitTest>,

    /// Set the change topic after upload
    pub set_topic: Option<bool>,
}

impl ReviewDefaults {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            if !(host.starts_with("http://") || host.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "review host '{}' must be an http(s) URL",
                    host
                )));
            }
        }

        for who in self.reviewers.iter().chain(self.ccs.iter()).flatten() {
            if who.is_empty() || who.contains(',') || who.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid reviewer or cc '{}'",
                    who
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.user.is_none());
            assert!(config.interactive.is_none());
            assert!(config.review.is_none());
        }

        #[test]
        fn empty_user_rejected() {
            let config = GlobalConfig {
                user: Some("  ".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn parses_review_table() {
            let config: GlobalConfig = toml::from_str(
                r#"
                user = "alice"

                [review]
                host = "https://review.example.com"
                reviewers = ["bob"]
                presubmit = "none"
                "#,
            )
            .unwrap();

            let review = config.review.as_ref().unwrap();
            assert_eq!(review.presubmit, Some(PresubmitTest::None));
            assert_eq!(review.reviewers.as_deref(), Some(&["bob".to_string()][..]));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_presubmit_fails_to_parse() {
            let result: Result<GlobalConfig, _> = toml::from_str(
                r#"
                [review]
                presubmit = ""
                "#,
            );
            assert!(result.is_err());
        }
    }

    mod repo_config {
        use super::*;

        #[test]
        fn valid_upstream() {
            let config = RepoConfig {
                upstream: Some("main".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_upstream() {
            let config = RepoConfig {
                upstream: Some("invalid..name".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn empty_remote_rejected() {
            let config = RepoConfig {
                remote: Some("".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                upstream = "main"
                trunk = "main"
            "#;

            let result: Result<RepoConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }

    mod review_defaults {
        use super::*;

        #[test]
        fn host_must_be_url() {
            let review = ReviewDefaults {
                host: Some("review.example.com".to_string()),
                ..Default::default()
            };
            assert!(review.validate().is_err());
        }

        #[test]
        fn reviewer_with_comma_rejected() {
            let review = ReviewDefaults {
                ccs: Some(vec!["a,b".to_string()]),
                ..Default::default()
            };
            assert!(review.validate().is_err());
        }
    }
}
