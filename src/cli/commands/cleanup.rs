//! cleanup command - Delete branches whose changes have landed upstream
//!
//! # Example
//!
//! ```bash
//! cl cleanup feature1
//! cl cleanup -f experiment
//! cl cleanup --remote-branch=release feature1
//! ```

use anyhow::Result;

use crate::engine::cleanup::{cleanup as cleanup_branches, CleanupOptions};
use crate::engine::Context;
use crate::ui::output;

use super::{open_session, parse_branch, verbosity};

/// Delete `branches` and everything recorded about them.
pub fn cleanup(
    ctx: &Context,
    branches: &[String],
    force: bool,
    remote_branch: Option<&str>,
) -> Result<()> {
    let branches = branches
        .iter()
        .map(|b| parse_branch(b))
        .collect::<Result<Vec<_>>>()?;
    let remote_branch = remote_branch.map(parse_branch).transpose()?;

    let session = open_session(ctx)?;
    let report = cleanup_branches(
        &session,
        &branches,
        &CleanupOptions {
            force,
            remote_branch,
        },
    )?;

    let v = verbosity(ctx);
    for branch in &report.deleted {
        output::print(format!("Deleted {}", branch), v);
    }
    if !report.rewritten.is_empty() {
        output::print("Updated dependencies of:", v);
        output::print(output::format_list(&report.rewritten, "  "), v);
    }
    Ok(())
}
