//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--interactive` / `--no-interactive`: Control prompts
//! - `--quiet` / `-q`: Minimal output
//! - `--no-verify`: Skip the pre-push hook when uploading

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::core::labels::PresubmitTest;

/// cl - Chains of dependent changelists reviewed on Gerrit
#[derive(Parser, Debug)]
#[command(name = "cl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if cl was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// Skip the pre-push hook when uploading
    #[arg(long, global = true)]
    pub no_verify: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Interactivity requested on the command line, if any.
    ///
    /// `--quiet` counts as `--no-interactive`.
    pub fn interactive_override(&self) -> Option<bool> {
        if self.interactive_flag {
            Some(true)
        } else if self.no_interactive || self.quiet {
            Some(false)
        } else {
            None
        }
    }

    /// Resolve interactivity: the command line wins, then the configured
    /// default, and prompts are only offered when stdin is a terminal.
    pub fn interactive(&self, configured: bool) -> bool {
        self.interactive_override()
            .unwrap_or_else(|| configured && std::io::stdin().is_terminal())
    }

    /// Whether hooks run on upload.
    pub fn verify(&self) -> bool {
        !self.no_verify
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a branch that depends on the current one
    #[command(
        name = "new",
        long_about = "Create a branch that depends on the current one.\n\n\
            The new branch starts at the current branch's tip and records the \
            current branch, and everything it depends on, as its ancestors. \
            Later `cl sync` and `cl mail` invocations use that record.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start a chain on top of master
    git checkout master
    cl new feature1

    # Stack a second change on the first
    cl new feature2
    cl deps              # master -> feature1 -> feature2"
    )]
    New {
        /// Name of the branch to create
        name: String,
    },

    /// Merge every ancestor into its descendant, down to the current branch
    #[command(
        name = "sync",
        long_about = "Propagate changes down the current branch's chain.\n\n\
            Pulls the upstream from the remote, then merges each branch of the \
            chain into the next one, ending at the current branch. Stops at the \
            first conflict and explains how to resolve it by hand.",
        after_help = "\
WORKFLOW EXAMPLES:
    # After master moved or feature1 changed
    cl sync

    # Only propagate local changes
    cl sync --no-pull"
    )]
    Sync {
        /// Do not pull the upstream before merging
        #[arg(long)]
        no_pull: bool,
    },

    /// Delete branches whose changes have landed upstream
    #[command(
        name = "cleanup",
        long_about = "Delete branches whose changes have landed upstream.\n\n\
            Each branch is merged with the upstream first and only deleted if \
            nothing remains that the upstream does not already have. Review \
            branches and recorded metadata go with it, and branches that \
            depended on it stop doing so.",
        after_help = "\
WORKFLOW EXAMPLES:
    # feature1 was submitted
    cl cleanup feature1

    # Abandon a branch
    cl cleanup -f experiment"
    )]
    Cleanup {
        /// Delete even if the changes have not been merged
        #[arg(short, long)]
        force: bool,

        /// Remote branch the changes were merged into (defaults to the upstream)
        #[arg(long, value_name = "BRANCH")]
        remote_branch: Option<String>,

        /// Branches to delete
        #[arg(required = true)]
        branches: Vec<String>,
    },

    /// Upload the current branch for review as a single change
    #[command(
        name = "mail",
        long_about = "Upload the current branch for review as a single change.\n\n\
            The branch's changes, relative to the branch it depends on, are \
            squashed into one commit and pushed to Gerrit. Its ancestors are \
            squashed into commits of their own first, so the uploaded change \
            sits on top of its dependencies. Mailing again uploads a new patch \
            set of the same change.",
        after_help = "\
WORKFLOW EXAMPLES:
    # First upload opens the editor on the message
    cl mail -r alice

    # Ask for an automatic submit once approved
    cl mail --autosubmit

    # See what would be pushed
    cl mail --dry-run"
    )]
    Mail {
        /// Accept label changes without asking
        #[arg(short = 'y', long)]
        yes: bool,

        /// Build the review commit but do not upload it
        #[arg(long)]
        dry_run: bool,

        /// Upload as a draft
        #[arg(long)]
        draft: bool,

        /// Submit automatically once approved
        #[arg(long)]
        autosubmit: bool,

        /// Presubmit tests to run: all, none, or a named subset
        #[arg(long, value_name = "TYPE")]
        presubmit: Option<PresubmitTest>,

        /// Reviewers (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        reviewers: Vec<String>,

        /// Addresses to CC (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        cc: Vec<String>,

        /// Topic to set (defaults to <user>-<branch>)
        #[arg(long)]
        topic: Option<String>,

        /// Set the topic after uploading
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
        set_topic: Option<bool>,

        /// Open the editor on the change's message
        #[arg(long)]
        edit: bool,

        /// Refuse to run with uncommitted changes
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
        check_uncommitted: Option<bool>,

        /// Remote branch to upload against (defaults to the upstream)
        #[arg(long, value_name = "BRANCH")]
        remote_branch: Option<String>,

        /// Gerrit base URL for REST calls
        #[arg(long, value_name = "URL")]
        host: Option<String>,
    },

    /// Show the dependency chain of a branch
    #[command(name = "deps")]
    Deps {
        /// Branch to show (defaults to current)
        branch: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
