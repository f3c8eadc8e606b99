//! core::metadata::store
//!
//! File-backed storage of per-branch records.
//!
//! # Architecture
//!
//! Each branch with records owns a directory under
//! `<common_dir>/cl/branches/`; see [`ClPaths`] for the exact layout.
//! Writes go through [`write_atomic`], so an interrupted write leaves the
//! previous record intact.
//!
//! # Example
//!
//! ```ignore
//! use clchain::core::metadata::MetadataStore;
//!
//! let store = MetadataStore::new(paths);
//! if let Some(record) = store.read_dependencies(&branch)? {
//!     for ancestor in record.ancestors() {
//!         println!("{}", ancestor);
//!     }
//! }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::schema::{DependencyRecord, RecordError};
use crate::core::paths::{write_atomic, ClPaths, DEPENDENCY_PATH_FILE};
use crate::core::types::BranchName;

/// Errors from metadata storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record was read but its content is invalid.
    #[error("corrupt record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: RecordError,
    },
}

/// Store of dependency and commit-message records.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    paths: ClPaths,
}

impl MetadataStore {
    pub fn new(paths: ClPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ClPaths {
        &self.paths
    }

    /// Read the DependencyRecord of `branch`. `None` if there is none.
    pub fn read_dependencies(
        &self,
        branch: &BranchName,
    ) -> Result<Option<DependencyRecord>, StoreError> {
        let path = self.paths.dependency_path_file(branch);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        DependencyRecord::parse(branch, &text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    pub fn write_dependencies(
        &self,
        branch: &BranchName,
        record: &DependencyRecord,
    ) -> Result<(), StoreError> {
        let path = self.paths.dependency_path_file(branch);
        debug!(branch = %branch, path = %path.display(), "writing dependency record");
        write_atomic(&path, record.to_string().as_bytes())
            .map_err(|source| StoreError::Write { path, source })
    }

    /// Read the CommitMessageRecord of `branch`. `None` if there is none.
    pub fn read_commit_message(&self, branch: &BranchName) -> Result<Option<String>, StoreError> {
        read_optional(&self.paths.commit_message_file(branch))
    }

    pub fn write_commit_message(&self, branch: &BranchName, message: &str) -> Result<(), StoreError> {
        let path = self.paths.commit_message_file(branch);
        debug!(branch = %branch, path = %path.display(), "writing commit message record");
        write_atomic(&path, message.as_bytes()).map_err(|source| StoreError::Write { path, source })
    }

    /// Delete all records of `branch`.
    ///
    /// Records of branches nested below it (`branch/sub`) are kept. Empty
    /// directories left behind are pruned up to the branches directory.
    pub fn remove_branch(&self, branch: &BranchName) -> Result<(), StoreError> {
        for path in [
            self.paths.dependency_path_file(branch),
            self.paths.commit_message_file(branch),
        ] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed record"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Remove { path, source }),
            }
        }

        let root = self.paths.branches_dir();
        let mut dir = self.paths.branch_dir(branch);
        while dir != root && dir.starts_with(&root) {
            // Fails when non-empty or already gone; either way stop pruning.
            if fs::remove_dir(&dir).is_err() {
                break;
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(())
    }

    /// All branches that have a DependencyRecord, sorted by name.
    pub fn list_dependency_records(&self) -> Result<Vec<BranchName>, StoreError> {
        let mut branches = Vec::new();
        let root = self.paths.branches_dir();
        if root.is_dir() {
            self.collect_records(&root, &mut branches)?;
        }
        branches.sort();
        Ok(branches)
    }

    fn collect_records(&self, dir: &Path, out: &mut Vec<BranchName>) -> Result<(), StoreError> {
        let read_err = |source| StoreError::Read {
            path: dir.to_path_buf(),
            source,
        };
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_records(&path, out)?;
            } else if entry.file_name() == DEPENDENCY_PATH_FILE {
                if let Some(branch) = self.paths.branch_from_dir(dir) {
                    out.push(branch);
                }
            }
        }
        Ok(())
    }

    /// Remove `branch` from every DependencyRecord that names it.
    ///
    /// Returns the branches whose record was rewritten.
    pub fn remove_from_all_records(
        &self,
        branch: &BranchName,
    ) -> Result<Vec<BranchName>, StoreError> {
        let mut rewritten = Vec::new();
        for owner in self.list_dependency_records()? {
            let Some(mut record) = self.read_dependencies(&owner)? else {
                continue;
            };
            if record.remove(branch) {
                self.write_dependencies(&owner, &record)?;
                rewritten.push(owner);
            }
        }
        Ok(rewritten)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
