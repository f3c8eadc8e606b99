//! engine::sync
//!
//! Propagate changes down a dependency chain.
//!
//! For the chain `master -> feature1 -> feature2` (current branch last),
//! syncing merges `master` into `feature1`, then `feature1` into
//! `feature2`. The first conflict aborts that merge and stops the walk;
//! earlier merges are kept.

use tracing::{debug, info, warn};

use crate::core::types::BranchName;
use crate::git::{GitError, GitState, MergeOptions};

use super::chain::full_chain;
use super::workspace::{BranchGuard, StashGuard};
use super::{ClError, Session};

/// Options for [`sync`].
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Pull the upstream from the remote before merging.
    pub pull: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { pull: true }
    }
}

/// What a successful sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The full chain, upstream first, synced branch last.
    pub chain: Vec<BranchName>,
    /// Whether the upstream was pulled from the remote.
    pub pulled: bool,
    /// `(ancestor, descendant)` pairs merged, in order.
    pub merged: Vec<(BranchName, BranchName)>,
}

/// Merge every ancestor of the current branch into its descendant.
///
/// # Errors
///
/// [`ClError::SyncConflict`] on the first conflicting merge. The working
/// tree is restored to its pre-merge state and the starting branch is
/// checked out again.
pub fn sync(session: &Session, opts: SyncOptions) -> Result<SyncReport, ClError> {
    let git = &session.git;
    session.ensure_idle()?;
    let original = session.current_branch()?;
    let chain = full_chain(&session.store, session.upstream(), &original)?;
    debug!(chain = ?chain, "syncing chain");

    let stash = StashGuard::push(git)?;
    let branches = BranchGuard::new(git, original.clone());

    let mut report = SyncReport {
        chain: chain.clone(),
        ..Default::default()
    };

    if opts.pull && session.git.remote_exists(session.remote()) {
        let head = &chain[0];
        git.checkout(head, false)?;
        info!(branch = %head, remote = session.remote(), "pulling");
        if let Err(e) = git.pull(session.remote(), head) {
            if git.state() == GitState::Merge {
                abort_merge(session);
            }
            return Err(e.into());
        }
        report.pulled = true;
    }

    for pair in chain.windows(2) {
        let (ancestor, descendant) = (&pair[0], &pair[1]);
        git.checkout(descendant, false)?;
        debug!(from = %ancestor, into = %descendant, "merging");
        match git.merge(ancestor.as_str(), MergeOptions::default()) {
            Ok(()) => report.merged.push((ancestor.clone(), descendant.clone())),
            Err(GitError::MergeConflict { detail, .. }) => {
                debug!(%detail, "merge conflict");
                abort_merge(session);
                return Err(ClError::SyncConflict {
                    ancestor: ancestor.clone(),
                    descendant: descendant.clone(),
                    original,
                    detail,
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    branches.release()?;
    stash.release()?;
    Ok(report)
}

fn abort_merge(session: &Session) {
    if let Err(e) = session.git.merge_abort() {
        warn!("failed to abort merge: {}", e);
    }
}
