//! cli::commands::mail
//!
//! Upload the current branch to Gerrit as a single change.
//!
//! # Design
//!
//! Command-line flags override the configured review defaults. The review
//! host for REST calls comes from `--host`, then `review.host`, then the
//! remote's URL when it is http(s).
//!
//! # Example
//!
//! ```bash
//! cl mail -r alice,bob --cc=carol
//! cl mail --presubmit=none --autosubmit
//! cl mail --dry-run
//! ```

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::core::labels::PresubmitTest;
use crate::core::types::BranchName;
use crate::engine::review::{MailOutcome, Review, ReviewOptions};
use crate::engine::{Context, Session};
use crate::forge::gerrit::host_from_remote_url;
use crate::forge::GerritForge;
use crate::ui::output;

use super::{open_session, parse_branch, verbosity};

/// Flags of `cl mail`.
#[derive(Debug, Clone, Default)]
pub struct MailArgs {
    pub yes: bool,
    pub dry_run: bool,
    pub draft: bool,
    pub autosubmit: bool,
    pub presubmit: Option<PresubmitTest>,
    pub reviewers: Vec<String>,
    pub ccs: Vec<String>,
    pub topic: Option<String>,
    pub set_topic: Option<bool>,
    pub edit: bool,
    pub check_uncommitted: Option<bool>,
    pub remote_branch: Option<String>,
    pub host: Option<String>,
}

/// Run the mail command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn mail(ctx: &Context, args: MailArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(mail_async(ctx, args))
}

async fn mail_async(ctx: &Context, args: MailArgs) -> Result<()> {
    let mut session = open_session(ctx)?;
    if let Some(remote_branch) = &args.remote_branch {
        session.set_upstream(parse_branch(remote_branch)?);
    }

    let branch = session.current_branch()?;
    let opts = review_options(ctx, &session, &args, branch);
    let host = review_host(&session, args.host);
    debug!(host = ?host, "review host");

    let forge = GerritForge::new(session.git.top_level_dir(), host);
    let outcome = Review::new(&session, &forge, ctx, opts.clone())
        .run()
        .await
        .with_context(|| format!("Failed to mail {}", opts.branch))?;

    let v = verbosity(ctx);
    match outcome {
        MailOutcome::Sent {
            reference,
            change_id,
            commit,
        } => {
            output::print(
                format!(
                    "Mailed {} to {} as {} ({})",
                    opts.branch,
                    reference,
                    commit.short(7),
                    change_id
                ),
                v,
            );
        }
        MailOutcome::DryRun { .. } | MailOutcome::Cancelled => {}
    }
    Ok(())
}

/// Configured defaults for the current branch, overridden by `args`.
fn review_options(
    ctx: &Context,
    session: &Session,
    args: &MailArgs,
    branch: BranchName,
) -> ReviewOptions {
    let mut opts = ReviewOptions::from_config(&session.config, branch);

    opts.labels.autosubmit = args.autosubmit;
    if let Some(presubmit) = &args.presubmit {
        opts.labels.presubmit = presubmit.clone();
    }
    opts.draft |= args.draft;
    if !args.reviewers.is_empty() {
        opts.reviewers = args.reviewers.clone();
    }
    if !args.ccs.is_empty() {
        opts.ccs = args.ccs.clone();
    }
    opts.topic = args.topic.clone();
    if let Some(set_topic) = args.set_topic {
        opts.set_topic = set_topic;
    }
    opts.edit = args.edit;
    if let Some(check) = args.check_uncommitted {
        opts.check_uncommitted = check;
    }
    opts.dry_run = args.dry_run;
    opts.verify = ctx.verify;
    opts.assume_yes = args.yes;
    opts
}

fn review_host(session: &Session, flag: Option<String>) -> Option<String> {
    flag.or_else(|| session.config.review_host()).or_else(|| {
        session
            .git
            .remote_url(session.remote())
            .and_then(|url| host_from_remote_url(&url))
    })
}
