//! new command - Create a branch that depends on the current one

use anyhow::Result;

use crate::engine::new::new_branch;
use crate::engine::Context;
use crate::ui::output;

use super::{open_session, parse_branch, verbosity};

/// Create and check out `name` on top of the current branch.
pub fn new(ctx: &Context, name: &str) -> Result<()> {
    let name = parse_branch(name)?;
    let session = open_session(ctx)?;

    let ancestors = new_branch(&session, &name)?;

    output::print(
        format!("Created {} on {}", name, output::format_chain(&ancestors)),
        verbosity(ctx),
    );
    Ok(())
}
