//! engine::workspace
//!
//! Scoped restoration of the user's working state.
//!
//! Commands that move between branches hold two guards:
//!
//! ```ignore
//! let stash = StashGuard::push(&git)?;          // declared first, dropped last
//! let mut branches = BranchGuard::new(&git, original);
//! // ... checkouts, review and temp branches ...
//! branches.release()?;
//! stash.release()?;
//! ```
//!
//! On every exit path the branch guard checks out the original branch and
//! deletes the temporary and review branches it tracks, then the stash
//! guard pops the stash. Explicit `release` reports failures; a guard
//! released by `Drop` (early return, `?`, panic) logs them instead.

use tracing::{debug, warn};

use crate::core::types::BranchName;
use crate::git::{Git, GitError};

/// Pops the stash pushed at construction, if one was pushed.
#[derive(Debug)]
pub struct StashGuard<'a> {
    git: &'a Git,
    stashed: bool,
}

impl<'a> StashGuard<'a> {
    /// Stash uncommitted changes to tracked files.
    pub fn push(git: &'a Git) -> Result<Self, GitError> {
        let stashed = git.stash()?;
        debug!(stashed, "stashed working changes");
        Ok(Self { git, stashed })
    }

    /// Pop the stash now, reporting failure.
    pub fn release(mut self) -> Result<(), GitError> {
        self.pop()
    }

    fn pop(&mut self) -> Result<(), GitError> {
        if std::mem::take(&mut self.stashed) {
            debug!("restoring stashed changes");
            self.git.stash_pop()?;
        }
        Ok(())
    }
}

impl Drop for StashGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.pop() {
            warn!("failed to restore stashed changes: {}", e);
        }
    }
}

/// Returns to a branch and deletes the ephemeral branches created meanwhile.
#[derive(Debug)]
pub struct BranchGuard<'a> {
    git: &'a Git,
    original: BranchName,
    review: Option<BranchName>,
    temps: Vec<BranchName>,
    released: bool,
}

impl<'a> BranchGuard<'a> {
    pub fn new(git: &'a Git, original: BranchName) -> Self {
        Self {
            git,
            original,
            review: None,
            temps: Vec::new(),
            released: false,
        }
    }

    /// Return to `branch` instead (the original one is going away).
    pub fn return_to(&mut self, branch: BranchName) {
        self.original = branch;
    }

    /// Delete `review` during cleanup.
    pub fn track_review(&mut self, review: BranchName) {
        self.review = Some(review);
    }

    /// Delete `temp` during cleanup unless it is untracked first.
    pub fn track_temp(&mut self, temp: BranchName) {
        self.temps.push(temp);
    }

    /// Forget `temp` after it has been deleted by its owner.
    pub fn untrack_temp(&mut self, temp: &BranchName) {
        self.temps.retain(|t| t != temp);
    }

    /// Restore now, reporting the first failure.
    ///
    /// Every step runs even if an earlier one failed.
    pub fn release(mut self) -> Result<(), GitError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), GitError> {
        if std::mem::replace(&mut self.released, true) {
            return Ok(());
        }

        let mut first_err: Option<GitError> = None;
        let mut record = |result: Result<(), GitError>, what: &str| {
            if let Err(e) = result {
                warn!("cleanup: failed to {}: {}", what, e);
                first_err.get_or_insert(e);
            }
        };

        debug!(branch = %self.original, "returning to original branch");
        record(self.git.checkout(&self.original, true), "check out original branch");

        for temp in self.temps.drain(..) {
            if self.git.branch_exists(&temp) {
                record(self.git.delete_branch(&temp, true), "delete temporary branch");
            }
        }

        if let Some(review) = self.review.take() {
            if self.git.branch_exists(&review) {
                debug!(branch = %review, "deleting review branch");
                record(self.git.delete_branch(&review, true), "delete review branch");
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for BranchGuard<'_> {
    fn drop(&mut self) {
        // Failures were already logged by restore.
        let _ = self.restore();
    }
}
