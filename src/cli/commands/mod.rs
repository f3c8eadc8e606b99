//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Converts command-specific arguments into engine types
//! 2. Opens a [`Session`] and calls the engine
//! 3. Formats and displays output
//!
//! Handlers do NOT perform repository mutations directly.
//!
//! # Async Commands
//!
//! `mail` talks to Gerrit and is async. Its handler creates a tokio
//! runtime and blocks on the async implementation.

mod cleanup;
mod completion;
mod deps;
mod mail;
mod new;
mod sync;

// Re-export command functions for testing and direct invocation
pub use cleanup::cleanup;
pub use completion::completion;
pub use deps::deps;
pub use mail::{mail, MailArgs};
pub use new::new;
pub use sync::sync;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::core::types::BranchName;
use crate::engine::{Context, Session};
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::New { name } => new::new(ctx, &name),
        Command::Sync { no_pull } => sync::sync(ctx, !no_pull),
        Command::Cleanup {
            force,
            remote_branch,
            branches,
        } => cleanup::cleanup(ctx, &branches, force, remote_branch.as_deref()),
        Command::Mail {
            yes,
            dry_run,
            draft,
            autosubmit,
            presubmit,
            reviewers,
            cc,
            topic,
            set_topic,
            edit,
            check_uncommitted,
            remote_branch,
            host,
        } => mail::mail(
            ctx,
            MailArgs {
                yes,
                dry_run,
                draft,
                autosubmit,
                presubmit,
                reviewers,
                ccs: cc,
                topic,
                set_topic,
                edit,
                check_uncommitted,
                remote_branch,
                host,
            },
        ),
        Command::Deps { branch } => deps::deps(ctx, branch.as_deref()),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Open the session every repository command starts from.
fn open_session(ctx: &Context) -> Result<Session> {
    Session::open(ctx).context("Failed to open repository")
}

fn parse_branch(name: &str) -> Result<BranchName> {
    BranchName::new(name).with_context(|| format!("Invalid branch name '{}'", name))
}

fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}
