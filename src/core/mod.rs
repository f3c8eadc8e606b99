//! core
//!
//! Core domain types, records, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, ChangeId
//! - [`labels`] - Commit message trailer model
//! - [`naming`] - Names derived from user branches (review, temp, topic)
//! - [`metadata`] - Per-branch records and their storage
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for tool storage
//!
//! Nothing in here touches the repository's refs or working tree; that is
//! the job of [`crate::git`] and [`crate::engine`].

pub mod config;
pub mod labels;
pub mod metadata;
pub mod naming;
pub mod paths;
pub mod types;
