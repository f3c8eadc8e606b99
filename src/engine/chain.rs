//! engine::chain
//!
//! Dependency chain resolution.
//!
//! A branch's chain is its recorded ancestors, upstream first. Branches
//! that were never created with `cl new` depend on the upstream alone.

use crate::core::metadata::MetadataStore;
use crate::core::types::BranchName;

use super::ClError;

/// Ancestors of `branch`, upstream first.
///
/// - Record present: its contents.
/// - No record and `branch` is not `upstream`: `[upstream]`.
/// - No record and `branch` is `upstream`: `[]`.
pub fn resolve_chain(
    store: &MetadataStore,
    upstream: &BranchName,
    branch: &BranchName,
) -> Result<Vec<BranchName>, ClError> {
    match store.read_dependencies(branch)? {
        Some(record) => Ok(record.into_ancestors()),
        None if branch == upstream => Ok(Vec::new()),
        None => Ok(vec![upstream.clone()]),
    }
}

/// [`resolve_chain`] followed by `branch` itself.
pub fn full_chain(
    store: &MetadataStore,
    upstream: &BranchName,
    branch: &BranchName,
) -> Result<Vec<BranchName>, ClError> {
    let mut chain = resolve_chain(store, upstream, branch)?;
    chain.push(branch.clone());
    Ok(chain)
}
