//! engine::squash
//!
//! Review branch construction.
//!
//! The review branch starts at `<remote>/<upstream>` and receives one
//! commit per branch of the chain (ancestors first, target last). Each
//! commit is made in two passes:
//!
//! 1. `git merge --squash -s ours <b>` and commit, which records the
//!    message without touching the tree;
//! 2. move the index and working tree to `<b>` and amend, which replaces
//!    the tree with exactly `<b>`'s.
//!
//! The second pass means the incoming branch always wins: a review commit's
//! tree is the branch's tree, whatever the upstream holds. Author and
//! committer dates are pinned to the branch's last commit so rebuilding an
//! unchanged chain yields the same commit hashes.

use tracing::{debug, info};

use crate::core::labels::compose_default_message;
use crate::core::naming::{review_branch_name, tmp_branch_name};
use crate::core::types::BranchName;
use crate::git::{CommitDates, CommitOptions, MergeOptions, MergeStrategy, ResetMode};

use super::workspace::BranchGuard;
use super::{ClError, Session};

/// Inputs of [`create_review_branch`].
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    /// Branch being reviewed
    pub target: &'a BranchName,
    /// Ancestors of the target, upstream first
    pub chain: &'a [BranchName],
    /// Message of the target's commit
    pub message: &'a str,
    /// Open the editor on the target's message
    pub edit: bool,
    /// Skip the empty-change check
    pub dry_run: bool,
}

/// A built review branch, checked out and positioned on the target's commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewBranch {
    pub name: BranchName,
    /// Dates pinned on the final commit, for later amends
    pub dates: CommitDates,
}

/// Build `<target>-REVIEW`.
///
/// The review branch and temporary branches are registered with `guard`,
/// which deletes them when the command finishes, successfully or not.
///
/// # Errors
///
/// - [`ClError::EmptyChange`] if the target's tree equals the upstream's
///   (not checked on dry runs)
/// - [`ClError::ChangeConflict`] if squashing a branch fails
pub fn create_review_branch(
    session: &Session,
    guard: &mut BranchGuard<'_>,
    request: &BuildRequest<'_>,
) -> Result<ReviewBranch, ClError> {
    let git = &session.git;
    let target = request.target;
    let review = review_branch_name(target)?;

    git.fetch(session.remote(), session.upstream())?;

    if git.branch_exists(&review) {
        debug!(branch = %review, "deleting stale review branch");
        git.delete_branch(&review, true)?;
    }

    let remote_upstream = session.remote_upstream();
    git.create_branch(&review, Some(&remote_upstream))?;
    guard.track_review(review.clone());
    git.checkout(&review, false)?;

    if !request.dry_run && !git.diff_has_changes(review.as_str(), target.as_str())? {
        return Err(ClError::EmptyChange {
            branch: target.clone(),
        });
    }

    let ancestors = request.chain.iter().skip(1);
    let mut dates = None;
    for (offset, branch) in ancestors.chain(std::iter::once(target)).enumerate() {
        // Position of `branch` in chain ++ [target]; its base precedes it.
        let index = offset + 1;
        let is_target = branch == target;
        info!(branch = %branch, review = %review, "squashing");

        git.merge(
            branch.as_str(),
            MergeOptions {
                squash: true,
                strategy: Some(MergeStrategy::Ours),
            },
        )
        .map_err(|e| ClError::ChangeConflict {
            branch: branch.clone(),
            detail: e.to_string(),
        })?;

        let branch_dates = git.commit_dates(branch.as_str())?;
        let message = if is_target {
            request.message.to_string()
        } else {
            ancestor_message(session, request.chain, index, branch)?
        };
        git.commit(
            &message,
            CommitOptions {
                edit: is_target && request.edit,
                dates: Some(&branch_dates),
            },
        )?;

        replay_tree(session, guard, &review, branch, &branch_dates)?;
        dates = Some(branch_dates);
    }

    // The loop always runs at least once, for the target.
    let dates = match dates {
        Some(d) => d,
        None => git.commit_dates(target.as_str())?,
    };
    Ok(ReviewBranch {
        name: review,
        dates,
    })
}

/// Swap the tree of HEAD's commit for `branch`'s tree.
fn replay_tree(
    session: &Session,
    guard: &mut BranchGuard<'_>,
    review: &BranchName,
    branch: &BranchName,
    dates: &CommitDates,
) -> Result<(), ClError> {
    let git = &session.git;
    let tmp = tmp_branch_name(review, branch)?;
    if git.branch_exists(&tmp) {
        git.delete_branch(&tmp, true)?;
    }
    git.create_branch(&tmp, None)?;
    guard.track_temp(tmp.clone());

    git.reset(branch.as_str(), ResetMode::Hard)?;
    git.reset(tmp.as_str(), ResetMode::Soft)?;
    git.commit_amend(None, Some(dates))?;

    git.delete_branch(&tmp, true)?;
    guard.untrack_temp(&tmp);
    Ok(())
}

/// Message for an ancestor's commit: its last mailed message, or its own
/// commit messages if it was never mailed.
fn ancestor_message(
    session: &Session,
    chain: &[BranchName],
    index: usize,
    branch: &BranchName,
) -> Result<String, ClError> {
    if let Some(message) = session.store.read_commit_message(branch)? {
        return Ok(message);
    }
    let base = base_revision(session, chain, index);
    let messages = session.git.commit_messages(&base, branch.as_str())?;
    Ok(compose_default_message(&messages))
}

/// Revision a chain element's own commits start from.
///
/// The first element after the upstream is measured from
/// `<remote>/<upstream>`; later ones from their predecessor.
pub fn base_revision(session: &Session, chain: &[BranchName], index: usize) -> String {
    match index {
        0 | 1 => session.remote_upstream(),
        i => chain
            .get(i - 1)
            .map(|b| b.to_string())
            .unwrap_or_else(|| session.remote_upstream()),
    }
}
