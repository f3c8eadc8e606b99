//! core::naming
//!
//! Names of the branches and topics the tool derives from a user branch.
//!
//! # Example
//!
//! ```
//! use clchain::core::naming::{review_branch_name, tmp_branch_name};
//! use clchain::core::types::BranchName;
//!
//! let branch = BranchName::new("feature").unwrap();
//! let review = review_branch_name(&branch).unwrap();
//! assert_eq!(review.as_str(), "feature-REVIEW");
//!
//! let ancestor = BranchName::new("base").unwrap();
//! let tmp = tmp_branch_name(&review, &ancestor).unwrap();
//! assert_eq!(tmp.as_str(), "feature-REVIEW-base-TMP");
//! ```

use crate::core::types::{BranchName, TypeError};

/// Suffix of the ephemeral branch that gets pushed for review.
pub const REVIEW_SUFFIX: &str = "-REVIEW";

/// Ephemeral review branch for `branch`: `<branch>-REVIEW`.
pub fn review_branch_name(branch: &BranchName) -> Result<BranchName, TypeError> {
    BranchName::new(format!("{}{}", branch, REVIEW_SUFFIX))
}

/// Temporary branch used while replaying `branch` onto `review`.
pub fn tmp_branch_name(review: &BranchName, branch: &BranchName) -> Result<BranchName, TypeError> {
    BranchName::new(format!("{}-{}-TMP", review, branch))
}

/// Default Gerrit topic: `<user>-<branch>`.
///
/// # Example
///
/// ```
/// use clchain::core::naming::default_topic;
/// use clchain::core::types::BranchName;
///
/// let branch = BranchName::new("fix-parser").unwrap();
/// assert_eq!(default_topic("alice", &branch), "alice-fix-parser");
/// ```
pub fn default_topic(user: &str, branch: &BranchName) -> String {
    format!("{}-{}", user, branch)
}
