//! engine
//!
//! Chain operations: resolution, synchronization, review-branch
//! construction and submission.
//!
//! # Architecture
//!
//! Every command opens a [`Session`] (repository, records, configuration)
//! and hands it to one operation module:
//!
//! - [`chain`] - Dependency chain resolution
//! - [`sync`] - Merge each ancestor into its descendant
//! - [`squash`] - Build the single-commit review branch
//! - [`review`] - The `mail` flow around the builder
//! - [`cleanup`] - Delete merged branches and their records
//! - [`new`] - Create a branch on top of the current one
//! - [`workspace`] - Guards restoring the user's branch and stash
//!
//! # Invariants
//!
//! - Operations that move between branches return to the starting branch
//!   and restore stashed changes on every exit path.
//! - Ephemeral review and temporary branches never outlive a command.
//! - Failures are reported as [`ClError`].

pub mod chain;
pub mod cleanup;
mod error;
pub mod new;
pub mod review;
pub mod squash;
pub mod sync;
pub mod workspace;

pub use error::ClError;

use std::path::PathBuf;

use tracing::debug;

use crate::core::config::Config;
use crate::core::metadata::MetadataStore;
use crate::core::paths::ClPaths;
use crate::core::types::BranchName;
use crate::git::Git;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
    /// Git hook verification enabled.
    /// When false, the upload is pushed with --no-verify.
    pub verify: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            debug: false,
            quiet: false,
            interactive: true,
            verify: true,
        }
    }
}

impl Context {
    /// Directory commands operate from.
    pub fn cwd(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// An opened repository with its records and configuration.
#[derive(Debug)]
pub struct Session {
    pub git: Git,
    pub store: MetadataStore,
    pub config: Config,
    remote: String,
    upstream: BranchName,
}

impl Session {
    /// Open the repository containing `ctx`'s working directory.
    pub fn open(ctx: &Context) -> Result<Self, ClError> {
        let cwd = ctx.cwd().map_err(|e| crate::git::GitError::Internal {
            message: format!("cannot determine working directory: {}", e),
        })?;
        let git = Git::open(&cwd)?;
        let paths = ClPaths::from_repo_info(&git.info());
        let config = Config::load(Some(&paths))?;
        Self::with_config(git, config)
    }

    /// Build a session with an explicit configuration.
    pub fn with_config(git: Git, config: Config) -> Result<Self, ClError> {
        let paths = ClPaths::from_repo_info(&git.info());
        let remote = config.remote().to_string();
        let upstream = config.upstream_branch()?;
        debug!(remote = %remote, upstream = %upstream, "opened session");
        Ok(Self {
            git,
            store: MetadataStore::new(paths),
            config,
            remote,
            upstream,
        })
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn upstream(&self) -> &BranchName {
        &self.upstream
    }

    /// Override the configured upstream for this session.
    pub fn set_upstream(&mut self, upstream: BranchName) {
        debug!(upstream = %upstream, "upstream overridden");
        self.upstream = upstream;
    }

    /// `<remote>/<upstream>`.
    pub fn remote_upstream(&self) -> String {
        format!("{}/{}", self.remote, self.upstream)
    }

    /// The checked-out branch.
    ///
    /// # Errors
    ///
    /// [`ClError::DetachedHead`] if HEAD is not on a branch.
    pub fn current_branch(&self) -> Result<BranchName, ClError> {
        self.git.current_branch()?.ok_or(ClError::DetachedHead)
    }

    /// Refuse to start while another Git operation is unfinished.
    pub fn ensure_idle(&self) -> Result<(), ClError> {
        let state = self.git.state();
        if state.is_in_progress() {
            return Err(ClError::OperationInProgress { state });
        }
        Ok(())
    }
}
