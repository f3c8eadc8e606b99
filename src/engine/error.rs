//! engine::error
//!
//! The closed set of failures a chain command can end with.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::metadata::StoreError;
use crate::core::types::{BranchName, TypeError};
use crate::forge::ForgeError;
use crate::git::{GitError, GitState};
use crate::ui::prompts::PromptError;

/// Errors from chain operations.
#[derive(Debug, Error)]
pub enum ClError {
    #[error("uncommitted changes in tracked files:\n{}", bullet_list(.files))]
    UncommittedChanges { files: Vec<String> },

    #[error("branch {branch} has no changes relative to the upstream; nothing to review")]
    EmptyChange { branch: BranchName },

    #[error("failed to squash {branch} into the review branch:\n{detail}")]
    ChangeConflict { branch: BranchName, detail: String },

    /// A chain merge stopped on conflicts. The message is the manual
    /// recovery sequence.
    #[error(
        "failed to merge {ancestor} into {descendant}. Resolve the conflicts manually:\n\
         $ git checkout {descendant}\n\
         $ git merge {ancestor}\n\
         # resolve all conflicts\n\
         $ git commit -a\n\
         $ git checkout {original}\n\
         $ cl sync"
    )]
    SyncConflict {
        ancestor: BranchName,
        descendant: BranchName,
        original: BranchName,
        detail: String,
    },

    #[error("branch {branch} has changes not merged upstream:\n{}", bullet_list(.files))]
    UnmergedChanges {
        branch: BranchName,
        files: Vec<String>,
    },

    #[error("the review commit has no Change-Id; is Gerrit's commit-msg hook installed?")]
    NoChangeId,

    /// The review server refused the upload; carries its output verbatim.
    #[error("{0}")]
    Gerrit(String),

    #[error("cannot review from the remote-tracking branch {branch}")]
    ReviewFromUpstream { branch: BranchName },

    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error("a {state} is in progress; finish or abort it first")]
    OperationInProgress { state: GitState },

    #[error("branch {branch} already exists")]
    BranchExists { branch: BranchName },

    #[error("branch {branch} does not exist")]
    BranchNotFound { branch: BranchName },

    #[error("refusing to delete the upstream branch {branch}")]
    ProtectedBranch { branch: BranchName },

    #[error("failed to read {path}: {source}")]
    RecordUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt record {path}: {message}")]
    CorruptRecord { path: PathBuf, message: String },

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Forge(#[from] ForgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    InvalidName(#[from] TypeError),
}

impl ClError {
    /// Whether the failure is a content conflict the user must resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ClError::ChangeConflict { .. }
                | ClError::SyncConflict { .. }
                | ClError::UnmergedChanges { .. }
        )
    }
}

impl From<StoreError> for ClError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Read { path, source } => ClError::RecordUnreadable { path, source },
            StoreError::Corrupt { path, source } => ClError::CorruptRecord {
                path,
                message: source.to_string(),
            },
            other => ClError::Store(other),
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::RecordError;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn sync_conflict_lists_recovery_steps() {
        let err = ClError::SyncConflict {
            ancestor: b("feature1"),
            descendant: b("feature2"),
            original: b("feature3"),
            detail: "CONFLICT (content): Merge conflict in a.txt".into(),
        };
        let text = err.to_string();
        assert!(text.ends_with(
            "$ git checkout feature2\n\
             $ git merge feature1\n\
             # resolve all conflicts\n\
             $ git commit -a\n\
             $ git checkout feature3\n\
             $ cl sync"
        ));
        assert!(err.is_conflict());
    }

    #[test]
    fn uncommitted_changes_lists_files() {
        let err = ClError::UncommittedChanges {
            files: vec!["a.txt".into(), "b/c.txt".into()],
        };
        assert_eq!(
            err.to_string(),
            "uncommitted changes in tracked files:\n  a.txt\n  b/c.txt"
        );
        assert!(!err.is_conflict());
    }

    #[test]
    fn operation_in_progress_names_state() {
        let err = ClError::OperationInProgress {
            state: GitState::Rebase,
        };
        assert_eq!(
            err.to_string(),
            "a rebase is in progress; finish or abort it first"
        );
    }

    #[test]
    fn gerrit_error_is_verbatim() {
        let err = ClError::Gerrit("! [remote rejected] HEAD -> refs/for/master (no new changes)".into());
        assert_eq!(
            err.to_string(),
            "! [remote rejected] HEAD -> refs/for/master (no new changes)"
        );
    }

    #[test]
    fn store_errors_map_to_record_variants() {
        let err: ClError = StoreError::Corrupt {
            path: PathBuf::from("/x/dependency-path"),
            source: RecordError::Cycle("f1".into()),
        }
        .into();
        assert!(matches!(err, ClError::CorruptRecord { .. }));

        let err: ClError = StoreError::Read {
            path: PathBuf::from("/x"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, ClError::RecordUnreadable { .. }));
    }
}
