//! git::interface
//!
//! Git interface implementation.
//!
//! Queries (branch lookup, tree comparison, commit metadata, status) use
//! `git2`. Mutations that must honor the user's hooks and editor (commit,
//! merge, checkout, stash, fetch) run the `git` binary anchored at the
//! repository's top-level directory.
//!
//! # Error Handling
//!
//! Failures are normalized into [`GitError`]:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref or revision does not exist
//! - [`GitError::MergeConflict`]: A merge stopped on conflicts
//! - [`GitError::CommandFailed`]: The git binary exited non-zero
//!
//! # Example
//!
//! ```ignore
//! use clchain::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! if let Some(branch) = git.current_branch()? {
//!     println!("on {}", branch);
//! }
//! ```

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{DateTime, FixedOffset, TimeZone};
use thiserror::Error;
use tracing::debug;

use crate::core::paths::ClPaths;
use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref or revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Invalid object id or branch name coming back from Git.
    #[error("invalid value from git: {message}")]
    InvalidValue {
        /// Description of the problem
        message: String,
    },

    /// A merge stopped because of conflicts.
    ///
    /// The repository is left mid-merge; callers decide whether to abort.
    #[error("merging {branch} produced conflicts:\n{detail}")]
    MergeConflict {
        /// The branch being merged in
        branch: String,
        /// Output of the failed merge
        detail: String,
    },

    /// The git binary could not be started.
    #[error("failed to run `{command}`: {message}")]
    Spawn {
        /// The command line
        command: String,
        /// OS error text
        message: String,
    },

    /// The git binary exited unsuccessfully.
    #[error("`{command}` failed:\n{output}")]
    CommandFailed {
        /// The command line
        command: String,
        /// Combined stdout and stderr
        output: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RefNotFound {
                refname: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidValue {
            message: err.to_string(),
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to the per-worktree .git directory
    pub git_dir: PathBuf,
    /// Path to the shared .git directory
    pub common_dir: PathBuf,
    /// Path to the top-level working directory
    pub work_dir: PathBuf,
}

/// State of in-progress Git operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitState {
    /// No operation in progress.
    Clean,
    Rebase,
    Merge,
    CherryPick,
    Revert,
    Bisect,
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// # Example
    ///
    /// ```
    /// use clchain::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Merge.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Author and committer timestamps of a commit.
///
/// Replaying these onto a new commit (instead of "now") keeps its hash a
/// pure function of content, parents and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitDates {
    pub author: DateTime<FixedOffset>,
    pub committer: DateTime<FixedOffset>,
}

impl CommitDates {
    /// Format a timestamp in Git's raw `<unix-seconds> <+hhmm>` form.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{FixedOffset, TimeZone};
    /// use clchain::git::CommitDates;
    ///
    /// let tz = FixedOffset::east_opt(3600).unwrap();
    /// let when = tz.timestamp_opt(1_700_000_000, 0).unwrap();
    /// assert_eq!(CommitDates::raw(&when), "1700000000 +0100");
    /// ```
    pub fn raw(when: &DateTime<FixedOffset>) -> String {
        when.format("%s %z").to_string()
    }

    fn envs(&self) -> [(&'static str, String); 2] {
        [
            ("GIT_AUTHOR_DATE", Self::raw(&self.author)),
            ("GIT_COMMITTER_DATE", Self::raw(&self.committer)),
        ]
    }
}

/// Merge strategies the tool asks git for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep the current tree; record the other side as merged.
    Ours,
}

impl MergeStrategy {
    fn as_arg(&self) -> &'static str {
        match self {
            MergeStrategy::Ours => "ours",
        }
    }
}

/// Options for [`Git::merge`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Stage the result without creating a merge commit.
    pub squash: bool,
    pub strategy: Option<MergeStrategy>,
}

/// Modes for [`Git::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Hard,
    Soft,
}

/// Options for [`Git::commit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions<'a> {
    /// Open the user's editor on the message before committing.
    pub edit: bool,
    /// Pin author and committer timestamps.
    pub dates: Option<&'a CommitDates>,
}

/// The Git interface.
///
/// All repository reads and writes of the tool flow through this type.
pub struct Git {
    repo: git2::Repository,
    work_dir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(Self { repo, work_dir })
    }

    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir: self.work_dir.clone(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Top-level directory of the working tree.
    ///
    /// Every git invocation made by this interface runs from here.
    pub fn top_level_dir(&self) -> &Path {
        &self.work_dir
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get the current Git state (rebase, merge, etc.).
    pub fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    /// Check if there are unresolved conflicts in the index.
    pub fn has_conflicts(&self) -> Result<bool, GitError> {
        let mut index = self.repo.index()?;
        // The git binary may have rewritten the index behind libgit2's back.
        index.read(true)?;
        Ok(index.has_conflicts())
    }

    /// Tracked files whose content differs from HEAD (staged or not).
    ///
    /// Untracked files are not reported.
    pub fn uncommitted_files(&self) -> Result<Vec<String>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut files: Vec<String> = statuses
            .iter()
            .filter(|entry| !entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    // =========================================================================
    // Branches and Revisions
    // =========================================================================

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.repo
            .find_branch(branch.as_str(), git2::BranchType::Local)
            .is_ok()
    }

    pub fn remote_exists(&self, remote: &str) -> bool {
        self.repo.find_remote(remote).is_ok()
    }

    /// Fetch URL of `remote`, if the remote exists and has one.
    pub fn remote_url(&self, remote: &str) -> Option<String> {
        let remote = self.repo.find_remote(remote).ok()?;
        remote.url().map(str::to_string)
    }

    /// Resolve a revision (branch, remote-tracking ref, `HEAD`) to a commit.
    pub fn resolve(&self, rev: &str) -> Result<Oid, GitError> {
        let commit = self.find_commit(rev)?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    pub fn head_oid(&self) -> Result<Oid, GitError> {
        self.resolve("HEAD")
    }

    fn find_commit(&self, rev: &str) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .revparse_single(rev)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, rev))
    }

    fn tree_id(&self, rev: &str) -> Result<git2::Oid, GitError> {
        Ok(self.find_commit(rev)?.tree_id())
    }

    // =========================================================================
    // Content Comparison
    // =========================================================================

    /// Whether the trees at two revisions differ.
    pub fn diff_has_changes(&self, a: &str, b: &str) -> Result<bool, GitError> {
        Ok(self.tree_id(a)? != self.tree_id(b)?)
    }

    /// Paths that differ between the trees at two revisions.
    pub fn modified_files(&self, a: &str, b: &str) -> Result<Vec<String>, GitError> {
        let old_tree = self.find_commit(a)?.tree()?;
        let new_tree = self.find_commit(b)?.tree()?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

        let mut files: Vec<String> = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    // =========================================================================
    // Commit Information
    // =========================================================================

    /// Messages of the non-merge commits reachable from `tip` but not
    /// from `base`, oldest first.
    pub fn commit_messages(&self, base: &str, tip: &str) -> Result<Vec<String>, GitError> {
        let base_oid = self.find_commit(base)?.id();
        let tip_oid = self.find_commit(tip)?.id();

        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
        walk.push(tip_oid)?;
        walk.hide(base_oid)?;

        let mut messages = Vec::new();
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() > 1 {
                continue;
            }
            messages.push(commit.message().unwrap_or("").to_string());
        }
        Ok(messages)
    }

    /// Full message of the commit at HEAD.
    pub fn latest_commit_message(&self) -> Result<String, GitError> {
        let commit = self.find_commit("HEAD")?;
        Ok(commit.message().unwrap_or("").to_string())
    }

    /// Author and committer timestamps of the commit at `rev`.
    pub fn commit_dates(&self, rev: &str) -> Result<CommitDates, GitError> {
        let commit = self.find_commit(rev)?;
        let author = to_datetime(commit.author().when())?;
        let committer = to_datetime(commit.committer().when())?;
        Ok(CommitDates { author, committer })
    }

    // =========================================================================
    // Mutations (git binary)
    // =========================================================================

    pub fn checkout(&self, branch: &BranchName, force: bool) -> Result<(), GitError> {
        let mut args = vec!["checkout"];
        if force {
            args.push("-f");
        }
        args.push(branch.as_str());
        self.run(&args).map(drop)
    }

    /// Create a branch at HEAD, or at `upstream` tracking it.
    pub fn create_branch(&self, branch: &BranchName, upstream: Option<&str>) -> Result<(), GitError> {
        match upstream {
            Some(start) => self.run(&["branch", "--track", branch.as_str(), start]),
            None => self.run(&["branch", branch.as_str()]),
        }
        .map(drop)
    }

    pub fn delete_branch(&self, branch: &BranchName, force: bool) -> Result<(), GitError> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, branch.as_str()]).map(drop)
    }

    pub fn fetch(&self, remote: &str, branch: &BranchName) -> Result<(), GitError> {
        self.run(&["fetch", remote, branch.as_str()]).map(drop)
    }

    /// Pull `branch` from `remote` into the current branch.
    pub fn pull(&self, remote: &str, branch: &BranchName) -> Result<(), GitError> {
        self.run(&["pull", "--no-rebase", "--no-edit", remote, branch.as_str()])
            .map(drop)
    }

    /// Merge `rev` into the current branch.
    ///
    /// # Errors
    ///
    /// [`GitError::MergeConflict`] when the merge stops on conflicts. The
    /// repository is left mid-merge.
    pub fn merge(&self, rev: &str, opts: MergeOptions) -> Result<(), GitError> {
        let mut args = vec!["merge"];
        if opts.squash {
            args.push("--squash");
        } else {
            args.push("--no-edit");
        }
        if let Some(strategy) = opts.strategy {
            args.push("-s");
            args.push(strategy.as_arg());
        }
        args.push(rev);

        match self.run(&args) {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { output, .. }) if self.has_conflicts()? => {
                Err(GitError::MergeConflict {
                    branch: rev.to_string(),
                    detail: output,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Abandon a merge in progress, restoring the pre-merge state.
    pub fn merge_abort(&self) -> Result<(), GitError> {
        if self.state() == GitState::Merge {
            self.run(&["merge", "--abort"]).map(drop)
        } else {
            // Squash merges leave no MERGE_HEAD behind.
            self.run(&["reset", "--merge"]).map(drop)
        }
    }

    pub fn reset(&self, rev: &str, mode: ResetMode) -> Result<(), GitError> {
        let mode = match mode {
            ResetMode::Hard => "--hard",
            ResetMode::Soft => "--soft",
        };
        self.run(&["reset", mode, rev]).map(drop)
    }

    /// Commit the index with `message`. Empty commits are allowed.
    ///
    /// Commit hooks run, so a Gerrit `commit-msg` hook can add a Change-Id.
    pub fn commit(&self, message: &str, opts: CommitOptions<'_>) -> Result<(), GitError> {
        let args = ["commit", "--allow-empty", "--allow-empty-message"];
        if opts.edit {
            let path = self.write_message_file(message)?;
            let path = path.to_string_lossy();
            let mut cmd = self.command(&args);
            cmd.args(["--edit", "-F", path.as_ref()]);
            if let Some(dates) = opts.dates {
                cmd.envs(dates.envs());
            }
            return self.run_interactive(cmd, "git commit --edit");
        }

        let mut cmd = self.command(&args);
        cmd.args(["-F", "-"]);
        if let Some(dates) = opts.dates {
            cmd.envs(dates.envs());
        }
        self.run_with_stdin(cmd, "git commit -F -", message)
            .map(drop)
    }

    /// Amend HEAD, replacing its message or keeping it when `message` is `None`.
    pub fn commit_amend(
        &self,
        message: Option<&str>,
        dates: Option<&CommitDates>,
    ) -> Result<(), GitError> {
        let mut cmd = self.command(&["commit", "--amend", "--allow-empty", "--allow-empty-message"]);
        if let Some(dates) = dates {
            cmd.envs(dates.envs());
        }
        match message {
            Some(message) => {
                cmd.args(["-F", "-"]);
                self.run_with_stdin(cmd, "git commit --amend -F -", message)
            }
            None => {
                cmd.arg("--no-edit");
                self.capture(cmd, "git commit --amend --no-edit")
            }
        }
        .map(drop)
    }

    /// Stash uncommitted changes to tracked files.
    ///
    /// Returns whether a stash entry was created.
    pub fn stash(&self) -> Result<bool, GitError> {
        let before = self.stash_size()?;
        self.run(&["stash", "push"])?;
        Ok(self.stash_size()? > before)
    }

    pub fn stash_pop(&self) -> Result<(), GitError> {
        self.run(&["stash", "pop"]).map(drop)
    }

    pub fn stash_size(&self) -> Result<usize, GitError> {
        let out = self.run(&["stash", "list"])?;
        Ok(out.lines().filter(|l| !l.trim().is_empty()).count())
    }

    // =========================================================================
    // Process helpers
    // =========================================================================

    /// A `git` command rooted at the top-level directory.
    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.work_dir).args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let shown = format!("git {}", args.join(" "));
        self.capture(self.command(args), &shown)
    }

    fn capture(&self, mut cmd: Command, shown: &str) -> Result<String, GitError> {
        debug!(command = %shown, "running git");
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| GitError::Spawn {
                command: shown.to_string(),
                message: e.to_string(),
            })?;
        finish(shown, output)
    }

    fn run_with_stdin(&self, mut cmd: Command, shown: &str, input: &str) -> Result<String, GitError> {
        debug!(command = %shown, "running git");
        let spawn_err = |e: std::io::Error| GitError::Spawn {
            command: shown.to_string(),
            message: e.to_string(),
        };

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;
        finish(shown, output)
    }

    /// Run with the terminal attached (for the user's editor).
    fn run_interactive(&self, mut cmd: Command, shown: &str) -> Result<(), GitError> {
        debug!(command = %shown, "running git interactively");
        let status = cmd.status().map_err(|e| GitError::Spawn {
            command: shown.to_string(),
            message: e.to_string(),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(GitError::CommandFailed {
                command: shown.to_string(),
                output: format!("exited with {}", status),
            })
        }
    }

    fn write_message_file(&self, message: &str) -> Result<PathBuf, GitError> {
        let path = ClPaths::from_repo_info(&self.info()).mail_message_path();
        let io_err = |e: std::io::Error| GitError::Internal {
            message: format!("failed to write {}: {}", path.display(), e),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&path, message).map_err(io_err)?;
        Ok(path)
    }
}

fn finish(shown: &str, output: std::process::Output) -> Result<String, GitError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Err(GitError::CommandFailed {
        command: shown.to_string(),
        output: combined,
    })
}

fn to_datetime(time: git2::Time) -> Result<DateTime<FixedOffset>, GitError> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or_else(|| {
        GitError::InvalidValue {
            message: format!("timezone offset {} minutes", time.offset_minutes()),
        }
    })?;
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(|| GitError::InvalidValue {
            message: format!("timestamp {}", time.seconds()),
        })
}
