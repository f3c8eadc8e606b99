//! cli::commands::sync
//!
//! Propagate changes down the current branch's chain.
//!
//! # Example
//!
//! ```bash
//! # master -> feature1 -> feature2, on feature2
//! cl sync             # pull master, merge master into feature1, feature1 into feature2
//! cl sync --no-pull   # same, without pulling
//! ```

use anyhow::Result;

use crate::engine::sync::{sync as sync_chain, SyncOptions};
use crate::engine::Context;
use crate::ui::output;

use super::{open_session, verbosity};

/// Run the sync command.
pub fn sync(ctx: &Context, pull: bool) -> Result<()> {
    let session = open_session(ctx)?;
    let report = sync_chain(&session, SyncOptions { pull })?;

    let v = verbosity(ctx);
    if report.pulled {
        output::print(
            format!("Pulled {}", session.remote_upstream()),
            v,
        );
    }
    for (ancestor, descendant) in &report.merged {
        output::print(format!("Merged {} into {}", ancestor, descendant), v);
    }
    output::print(format!("Synced {}", output::format_chain(&report.chain)), v);
    Ok(())
}
