//! engine::cleanup
//!
//! Delete branches whose changes have landed upstream.
//!
//! A branch is deletable when, after merging the upstream into it, it no
//! longer differs from the upstream. `force` skips that check. Deleting a
//! branch also deletes its review branch and records, and drops it from
//! the DependencyRecord of every branch that depended on it.

use tracing::{debug, info};

use crate::core::naming::review_branch_name;
use crate::core::types::BranchName;
use crate::git::{GitError, MergeOptions};

use super::workspace::{BranchGuard, StashGuard};
use super::{ClError, Session};

/// Options for [`cleanup`].
#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// Delete without checking that the changes were merged.
    pub force: bool,
    /// Remote branch to compare against; defaults to the upstream.
    pub remote_branch: Option<BranchName>,
}

/// What a successful cleanup did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<BranchName>,
    /// Branches whose DependencyRecord was rewritten
    pub rewritten: Vec<BranchName>,
}

/// Delete `branches`.
///
/// # Errors
///
/// - [`ClError::BranchNotFound`] / [`ClError::ProtectedBranch`] before
///   anything is touched
/// - [`ClError::UnmergedChanges`] if a branch still differs from the
///   upstream; branches earlier in the list stay deleted
pub fn cleanup(
    session: &Session,
    branches: &[BranchName],
    opts: &CleanupOptions,
) -> Result<CleanupReport, ClError> {
    let git = &session.git;
    let upstream = session.upstream();

    for branch in branches {
        if branch == upstream {
            return Err(ClError::ProtectedBranch {
                branch: branch.clone(),
            });
        }
        if !git.branch_exists(branch) {
            return Err(ClError::BranchNotFound {
                branch: branch.clone(),
            });
        }
    }

    session.ensure_idle()?;
    let original = session.current_branch()?;
    let remote_branch = opts.remote_branch.as_ref().unwrap_or(upstream);
    let has_remote = git.remote_exists(session.remote());
    let base = if has_remote {
        format!("{}/{}", session.remote(), remote_branch)
    } else {
        remote_branch.to_string()
    };

    let stash = StashGuard::push(git)?;
    let mut guard = BranchGuard::new(git, original.clone());

    git.checkout(upstream, false)?;
    if has_remote {
        info!(branch = %upstream, remote = session.remote(), "pulling");
        git.pull(session.remote(), upstream)?;
        if remote_branch != upstream {
            git.fetch(session.remote(), remote_branch)?;
        }
    }

    let mut report = CleanupReport::default();
    for branch in branches {
        if !opts.force {
            ensure_merged(session, branch, &base)?;
            git.checkout(upstream, false)?;
        }

        info!(branch = %branch, "deleting");
        git.delete_branch(branch, true)?;
        let review = review_branch_name(branch)?;
        if git.branch_exists(&review) {
            git.delete_branch(&review, true)?;
        }
        session.store.remove_branch(branch)?;
        report
            .rewritten
            .extend(session.store.remove_from_all_records(branch)?);
        report.deleted.push(branch.clone());

        if *branch == original {
            guard.return_to(upstream.clone());
        }
    }

    report.rewritten.retain(|b| !report.deleted.contains(b));
    report.rewritten.sort();
    report.rewritten.dedup();

    guard.release()?;
    stash.release()?;
    Ok(report)
}

/// Merge `base` into `branch` and check nothing else remains.
fn ensure_merged(session: &Session, branch: &BranchName, base: &str) -> Result<(), ClError> {
    let git = &session.git;
    git.checkout(branch, false)?;
    debug!(branch = %branch, base, "merging upstream before delete");
    if let Err(e) = git.merge(base, MergeOptions::default()) {
        if matches!(e, GitError::MergeConflict { .. }) {
            git.merge_abort()?;
        }
        return Err(e.into());
    }

    let files = git.modified_files(base, branch.as_str())?;
    if files.is_empty() {
        Ok(())
    } else {
        Err(ClError::UnmergedChanges {
            branch: branch.clone(),
            files,
        })
    }
}
