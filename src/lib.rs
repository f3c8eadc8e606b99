//! clchain - Chains of dependent changelists reviewed on Gerrit
//!
//! A branch can depend on another branch, which can depend on another,
//! down to the upstream. `cl` keeps such a chain merged from the bottom up
//! and uploads each branch as a single Gerrit change whose parent is the
//! change uploaded for the branch below it.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Chain resolution, sync, review-branch building, submission
//! - [`core`] - Domain types, records, labels, configuration
//! - [`git`] - Single interface for local Git operations
//! - [`forge`] - The review server (Gerrit) behind a trait
//! - [`ui`] - User interaction utilities
//!
//! # Invariants
//!
//! 1. Every command returns to the branch it started on and restores
//!    stashed changes, whether it succeeds or fails
//! 2. Review branches are temporary and never outlive a command
//! 3. Mailing unchanged content twice uploads an identical commit

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod git;
pub mod ui;
