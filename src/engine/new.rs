//! engine::new
//!
//! Start a new branch on top of the current one.

use tracing::{info, warn};

use crate::core::metadata::DependencyRecord;
use crate::core::types::BranchName;

use super::chain::full_chain;
use super::{ClError, Session};

/// Create and check out `name` from the current branch, recording the
/// current branch's chain as its ancestors.
///
/// Returns the recorded ancestors. On failure the original branch is
/// checked out again and the new branch deleted.
pub fn new_branch(session: &Session, name: &BranchName) -> Result<Vec<BranchName>, ClError> {
    let git = &session.git;
    session.ensure_idle()?;
    let original = session.current_branch()?;

    if git.branch_exists(name) {
        return Err(ClError::BranchExists {
            branch: name.clone(),
        });
    }

    let ancestors = full_chain(&session.store, session.upstream(), &original)?;

    git.create_branch(name, None)?;
    let result = git
        .checkout(name, false)
        .map_err(ClError::from)
        .and_then(|()| {
            session
                .store
                .write_dependencies(name, &DependencyRecord::new(ancestors.clone()))
                .map_err(ClError::from)
        });

    if let Err(e) = result {
        if let Err(undo) = git.checkout(&original, true) {
            warn!("failed to return to {}: {}", original, undo);
        }
        if let Err(undo) = git.delete_branch(name, true) {
            warn!("failed to delete {}: {}", name, undo);
        }
        return Err(e);
    }

    info!(branch = %name, parent = %original, "created branch");
    Ok(ancestors)
}
