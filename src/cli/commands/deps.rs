//! deps command - Show the dependency chain of a branch

use anyhow::Result;

use crate::engine::chain::full_chain;
use crate::engine::Context;

use super::{open_session, parse_branch};

/// Print `branch`'s chain, upstream first.
///
/// Always printed, even with `--quiet`: it is the command's result.
pub fn deps(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let session = open_session(ctx)?;
    let branch = match branch {
        Some(name) => parse_branch(name)?,
        None => session.current_branch()?,
    };

    let chain = full_chain(&session.store, session.upstream(), &branch)?;
    for name in &chain {
        println!("{}", name);
    }
    Ok(())
}
