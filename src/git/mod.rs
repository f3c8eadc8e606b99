//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the only doorway to the local repository. No other module
//! imports `git2`. The one `git` process spawned elsewhere is the upload in
//! [`crate::forge::GerritForge`], which talks to the remote and runs from
//! the same top-level directory.
//!
//! Reads go through `git2`. Mutations run the `git` binary so that the
//! user's hooks (notably Gerrit's `commit-msg`), editor and merge
//! configuration apply exactly as they would on the command line.
//!
//! # Invariants
//!
//! - Every `git` process runs with the top-level directory as its working
//!   directory; the process-wide current directory is never changed.
//! - All operations return strong types (Oid, BranchName).

mod interface;

pub use interface::{
    CommitDates, CommitOptions, Git, GitError, GitState, MergeOptions, MergeStrategy, RepoInfo,
    ResetMode,
};
