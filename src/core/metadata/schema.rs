//! core::metadata::schema
//!
//! On-disk formats of the per-branch records.
//!
//! # DependencyRecord
//!
//! Newline-separated branch names, nearest-to-upstream first:
//!
//! ```text
//! master
//! feature1
//! ```
//!
//! Blank lines and surrounding whitespace are ignored on read. A record
//! never names its own branch; one that does is reported as corrupt.
//!
//! # CommitMessageRecord
//!
//! The raw commit message last mailed for the branch.

use thiserror::Error;

use crate::core::types::BranchName;

/// Errors from parsing a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: {message}")]
    InvalidBranch { line: usize, message: String },

    #[error("branch '{0}' lists itself as a dependency")]
    Cycle(String),

    #[error("branch '{0}' is listed more than once")]
    Duplicate(String),
}

/// Ordered ancestors of a branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyRecord {
    ancestors: Vec<BranchName>,
}

impl DependencyRecord {
    pub fn new(ancestors: Vec<BranchName>) -> Self {
        Self { ancestors }
    }

    /// Parse the record of `owner`.
    ///
    /// # Example
    ///
    /// ```
    /// use clchain::core::metadata::DependencyRecord;
    /// use clchain::core::types::BranchName;
    ///
    /// let owner = BranchName::new("feature2").unwrap();
    /// let record = DependencyRecord::parse(&owner, "master\nfeature1\n").unwrap();
    /// assert_eq!(record.to_string(), "master\nfeature1\n");
    ///
    /// assert!(DependencyRecord::parse(&owner, "master\nfeature2\n").is_err());
    /// ```
    pub fn parse(owner: &BranchName, text: &str) -> Result<Self, RecordError> {
        let mut ancestors: Vec<BranchName> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let branch = BranchName::new(line).map_err(|e| RecordError::InvalidBranch {
                line: idx + 1,
                message: e.to_string(),
            })?;
            if &branch == owner {
                return Err(RecordError::Cycle(owner.to_string()));
            }
            if ancestors.contains(&branch) {
                return Err(RecordError::Duplicate(branch.to_string()));
            }
            ancestors.push(branch);
        }
        Ok(Self { ancestors })
    }

    pub fn ancestors(&self) -> &[BranchName] {
        &self.ancestors
    }

    pub fn into_ancestors(self) -> Vec<BranchName> {
        self.ancestors
    }

    pub fn contains(&self, branch: &BranchName) -> bool {
        self.ancestors.contains(branch)
    }

    /// Drop `branch` from the record. Returns whether it was present.
    pub fn remove(&mut self, branch: &BranchName) -> bool {
        let before = self.ancestors.len();
        self.ancestors.retain(|b| b != branch);
        self.ancestors.len() != before
    }
}

impl std::fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for branch in &self.ancestors {
            writeln!(f, "{}", branch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn parse_ignores_blank_lines_and_whitespace() {
        let record = DependencyRecord::parse(&b("f2"), "\n master \n\nf1\n").unwrap();
        assert_eq!(record.ancestors(), &[b("master"), b("f1")]);
    }

    #[test]
    fn parse_empty_record() {
        let record = DependencyRecord::parse(&b("f1"), "").unwrap();
        assert!(record.ancestors().is_empty());
        assert_eq!(record.to_string(), "");
    }

    #[test]
    fn parse_reports_line_of_invalid_branch() {
        let err = DependencyRecord::parse(&b("f1"), "master\nbad..name\n").unwrap_err();
        assert!(matches!(err, RecordError::InvalidBranch { line: 2, .. }));
    }

    #[test]
    fn parse_rejects_self_reference() {
        let err = DependencyRecord::parse(&b("f1"), "master\nf1\n").unwrap_err();
        assert_eq!(err, RecordError::Cycle("f1".to_string()));
    }

    #[test]
    fn parse_rejects_duplicates() {
        let err = DependencyRecord::parse(&b("f2"), "master\nmaster\n").unwrap_err();
        assert_eq!(err, RecordError::Duplicate("master".to_string()));
    }

    #[test]
    fn remove_reports_presence() {
        let mut record = DependencyRecord::new(vec![b("master"), b("f1")]);
        assert!(record.remove(&b("f1")));
        assert!(!record.remove(&b("f1")));
        assert_eq!(record.to_string(), "master\n");
    }
}
