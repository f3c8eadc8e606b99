//! core::paths
//!
//! Centralized path routing for clchain storage locations.
//!
//! # Storage Layout
//!
//! All tool data is stored under `<common_dir>/cl/`:
//! - `config.toml` - Repository configuration
//! - `branches/<branch>/dependency-path` - Ancestor chain of a branch
//! - `branches/<branch>/commit-message` - Last message mailed for a branch
//! - `MAIL_MSG` - Scratch file handed to `git commit -F`
//!
//! Repo-scoped storage uses `common_dir` so linked worktrees share the
//! same branch records. No code outside this module joins `"cl"` onto a
//! git directory.
//!
//! # Example
//!
//! ```
//! use clchain::core::paths::ClPaths;
//! use clchain::core::types::BranchName;
//! use std::path::PathBuf;
//!
//! let paths = ClPaths::new(PathBuf::from("/repo/.git"), PathBuf::from("/repo/.git"));
//! let branch = BranchName::new("feature").unwrap();
//!
//! assert_eq!(
//!     paths.dependency_path_file(&branch),
//!     PathBuf::from("/repo/.git/cl/branches/feature/dependency-path")
//! );
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::types::BranchName;
use crate::git::RepoInfo;

/// File name of a branch's dependency record.
pub const DEPENDENCY_PATH_FILE: &str = "dependency-path";

/// File name of a branch's persisted commit message.
pub const COMMIT_MESSAGE_FILE: &str = "commit-message";

/// Centralized path routing for clchain storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClPaths {
    /// Path to the per-worktree .git directory.
    pub git_dir: PathBuf,

    /// Path to the shared git directory (refs, objects, config).
    /// Equals `git_dir` outside linked worktrees.
    pub common_dir: PathBuf,
}

impl ClPaths {
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    /// Create ClPaths from a RepoInfo.
    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self {
            git_dir: info.git_dir.clone(),
            common_dir: info.common_dir.clone(),
        }
    }

    /// Root tool directory: `<common_dir>/cl`.
    pub fn repo_cl_dir(&self) -> PathBuf {
        self.common_dir.join("cl")
    }

    /// Repository configuration file: `<common_dir>/cl/config.toml`.
    pub fn repo_config_path(&self) -> PathBuf {
        self.repo_cl_dir().join("config.toml")
    }

    /// Directory holding one subdirectory per branch with records.
    pub fn branches_dir(&self) -> PathBuf {
        self.repo_cl_dir().join("branches")
    }

    /// Metadata directory of a single branch.
    ///
    /// Branch names containing `/` map to nested directories.
    pub fn branch_dir(&self, branch: &BranchName) -> PathBuf {
        let mut dir = self.branches_dir();
        for component in branch.as_str().split('/') {
            dir.push(component);
        }
        dir
    }

    pub fn dependency_path_file(&self, branch: &BranchName) -> PathBuf {
        self.branch_dir(branch).join(DEPENDENCY_PATH_FILE)
    }

    pub fn commit_message_file(&self, branch: &BranchName) -> PathBuf {
        self.branch_dir(branch).join(COMMIT_MESSAGE_FILE)
    }

    /// Scratch file for commit messages passed to `git commit -F`.
    ///
    /// Lives in the per-worktree git dir since it belongs to one checkout.
    pub fn mail_message_path(&self) -> PathBuf {
        self.git_dir.join("cl").join("MAIL_MSG")
    }

    /// Recover the branch name from a branch metadata directory.
    ///
    /// Returns `None` if `dir` is not below [`Self::branches_dir`] or the
    /// relative path is not a valid branch name.
    pub fn branch_from_dir(&self, dir: &Path) -> Option<BranchName> {
        let relative = dir.strip_prefix(self.branches_dir()).ok()?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?
            .join("/");
        BranchName::new(name).ok()
    }
}

/// Write `contents` to `path` atomically.
///
/// Creates parent directories, writes a sibling temp file, syncs it and
/// renames it over `path`. Readers see either the old or the new content.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)
}
