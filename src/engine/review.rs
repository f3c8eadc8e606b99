//! engine::review
//!
//! The `mail` flow: build the review branch for the current branch, record
//! its message, and upload it.
//!
//! ```text
//! refuse upstream -> confirm label changes -> check uncommitted -> stash
//!   -> load message -> build review branch -> record message -> push
//!   -> set topic -> (always) restore branch, delete review branch, pop stash
//! ```

use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::labels::{
    compose_default_message, label_changes, process_labels, CommitMessage, Labels,
};
use crate::core::naming::default_topic;
use crate::core::types::{BranchName, ChangeId, Oid};
use crate::forge::{review_reference, Forge, ForgeError, PushRequest};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts;

use super::chain::resolve_chain;
use super::squash::{base_revision, create_review_branch, BuildRequest, ReviewBranch};
use super::workspace::{BranchGuard, StashGuard};
use super::{ClError, Context, Session};

/// Everything a submission needs to know, fixed before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOptions {
    /// Branch to mail
    pub branch: BranchName,
    pub labels: Labels,
    /// Upload as draft
    pub draft: bool,
    pub reviewers: Vec<String>,
    pub ccs: Vec<String>,
    /// Topic to set; `None` means `<user>-<branch>`
    pub topic: Option<String>,
    pub set_topic: bool,
    /// Open the editor on the message
    pub edit: bool,
    /// Refuse to run with uncommitted changes to tracked files
    pub check_uncommitted: bool,
    /// Build everything but do not upload
    pub dry_run: bool,
    /// Run the pre-push hook
    pub verify: bool,
    /// Accept label changes without asking
    pub assume_yes: bool,
}

impl ReviewOptions {
    /// Options for `branch` with defaults taken from `config`.
    pub fn from_config(config: &Config, branch: BranchName) -> Self {
        Self {
            branch,
            labels: Labels {
                autosubmit: false,
                presubmit: config.presubmit(),
            },
            draft: config.draft(),
            reviewers: config.reviewers(),
            ccs: config.ccs(),
            topic: None,
            set_topic: config.set_topic(),
            edit: false,
            check_uncommitted: true,
            dry_run: false,
            verify: true,
            assume_yes: false,
        }
    }
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailOutcome {
    /// Uploaded to `reference`.
    Sent {
        reference: String,
        change_id: ChangeId,
        /// The uploaded commit
        commit: Oid,
    },
    /// Built but not uploaded.
    DryRun { reference: String },
    /// The user declined the label changes; nothing was touched.
    Cancelled,
}

/// A single submission.
pub struct Review<'a> {
    session: &'a Session,
    forge: &'a dyn Forge,
    opts: ReviewOptions,
    interactive: bool,
    verbosity: Verbosity,
}

impl<'a> Review<'a> {
    pub fn new(session: &'a Session, forge: &'a dyn Forge, ctx: &Context, opts: ReviewOptions) -> Self {
        Self {
            session,
            forge,
            opts,
            interactive: ctx.interactive,
            verbosity: Verbosity::from_flags(ctx.quiet, ctx.debug),
        }
    }

    /// Run the submission.
    pub async fn run(&self) -> Result<MailOutcome, ClError> {
        let session = self.session;
        let git = &session.git;
        let target = &self.opts.branch;

        if target == session.upstream() {
            return Err(ClError::ReviewFromUpstream {
                branch: target.clone(),
            });
        }

        session.ensure_idle()?;
        let persisted = session.store.read_commit_message(target)?;
        if !self.confirm_label_changes(persisted.as_deref())? {
            info!(branch = %target, "label changes declined");
            return Ok(MailOutcome::Cancelled);
        }

        if self.opts.check_uncommitted {
            let files = git.uncommitted_files()?;
            if !files.is_empty() {
                return Err(ClError::UncommittedChanges { files });
            }
        }

        let chain = resolve_chain(&session.store, session.upstream(), target)?;

        // Declared first so it is dropped last.
        let stash = StashGuard::push(git)?;
        let mut branches = BranchGuard::new(git, session.current_branch()?);

        let first_submission = persisted.is_none();
        let message = match &persisted {
            Some(text) => process_labels(text, &self.opts.labels),
            None => {
                let base = base_revision(session, &chain, chain.len());
                let messages = git.commit_messages(&base, target.as_str())?;
                process_labels(&compose_default_message(&messages), &self.opts.labels)
            }
        };
        let edit = self.opts.edit || (first_submission && self.interactive);

        let review = create_review_branch(
            session,
            &mut branches,
            &BuildRequest {
                target,
                chain: &chain,
                message: &message,
                edit,
                dry_run: self.opts.dry_run,
            },
        )?;

        let message = self.update_review_message(&review, first_submission)?;
        let outcome = self.send(&review, &message).await?;

        branches.release()?;
        stash.release()?;
        Ok(outcome)
    }

    /// Ask before changing labels of an already-mailed change.
    ///
    /// Returns `false` if the user declined.
    fn confirm_label_changes(&self, persisted: Option<&str>) -> Result<bool, ClError> {
        let Some(text) = persisted else {
            return Ok(true);
        };
        let changes = label_changes(&CommitMessage::parse(text), &self.opts.labels);
        if changes.is_empty() {
            return Ok(true);
        }

        output::print("Changes:", self.verbosity);
        output::print(output::format_list(&changes, ""), self.verbosity);

        if self.opts.assume_yes {
            return Ok(true);
        }
        if !self.interactive {
            info!("label changes need confirmation; not interactive and --yes not given");
            return Ok(false);
        }
        Ok(prompts::confirm(
            "Are you sure you want to make the above changes?",
            false,
            true,
        )?)
    }

    /// Normalize the review commit's message on first submission and
    /// record it.
    fn update_review_message(
        &self,
        review: &ReviewBranch,
        first_submission: bool,
    ) -> Result<String, ClError> {
        let git = &self.session.git;
        let mut message = git.latest_commit_message()?;

        if first_submission {
            let processed = process_labels(&message, &self.opts.labels);
            if processed != message {
                debug!(branch = %review.name, "normalizing review message");
                git.commit_amend(Some(&processed), Some(&review.dates))?;
                message = processed;
            }
        }

        if self.opts.dry_run {
            debug!("dry run: not recording commit message");
        } else {
            self.session
                .store
                .write_commit_message(&self.opts.branch, &message)?;
        }
        Ok(message)
    }

    async fn send(&self, review: &ReviewBranch, message: &str) -> Result<MailOutcome, ClError> {
        let session = self.session;
        let change_id = CommitMessage::parse(message).change_id;
        let reference = review_reference(
            session.upstream(),
            self.opts.draft,
            &self.opts.reviewers,
            &self.opts.ccs,
        );
        let request = PushRequest {
            remote: session.remote().to_string(),
            branch: review.name.clone(),
            reference: reference.clone(),
            verify: self.opts.verify,
        };

        if self.opts.dry_run {
            output::print(
                format!("[dry run] would push {} to {}", request.refspec(), request.remote),
                self.verbosity,
            );
            return Ok(MailOutcome::DryRun { reference });
        }

        let change_id = change_id.ok_or(ClError::NoChangeId)?;
        let commit = session.git.head_oid()?;

        info!(refspec = %request.refspec(), remote = %request.remote, "uploading");
        let pushed = self.forge.push(&request).await.map_err(|e| match e {
            ForgeError::PushRejected(message) => ClError::Gerrit(message),
            other => ClError::Forge(other),
        })?;
        for line in &pushed.remote_lines {
            output::print(line, self.verbosity);
        }

        if self.opts.set_topic {
            self.set_topic(&change_id).await?;
        }

        Ok(MailOutcome::Sent {
            reference,
            change_id,
            commit,
        })
    }

    async fn set_topic(&self, change_id: &ChangeId) -> Result<(), ClError> {
        let topic = match &self.opts.topic {
            Some(topic) => topic.clone(),
            None => match self.session.config.user() {
                Some(user) => default_topic(&user, &self.opts.branch),
                None => {
                    output::warn("no user name known; not setting a topic", self.verbosity);
                    return Ok(());
                }
            },
        };

        match self.forge.set_topic(change_id, &topic).await {
            Ok(()) => {
                info!(topic = %topic, "topic set");
                Ok(())
            }
            Err(ForgeError::NoHost) => {
                warn!("review host unknown; topic not set");
                output::warn(
                    "review host unknown (set review.host); topic not set",
                    self.verbosity,
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
