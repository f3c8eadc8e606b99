//! core::metadata
//!
//! Per-branch records and their storage.
//!
//! # Modules
//!
//! - [`schema`] - Record formats
//! - [`store`] - File-backed storage under `<common_dir>/cl/branches/`
//!
//! # Records
//!
//! - **DependencyRecord**: ordered ancestors of a branch, upstream first.
//!   Written by `cl new`, rewritten by `cl cleanup`.
//! - **CommitMessageRecord**: the message last mailed for the branch,
//!   Change-Id included. Written by `cl mail`.

pub mod schema;
pub mod store;

pub use schema::{DependencyRecord, RecordError};
pub use store::{MetadataStore, StoreError};
