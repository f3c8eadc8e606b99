//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge records every upload and topic request in memory and
//! can be configured to fail either operation. Nothing leaves the
//! process; no remote is required.
//!
//! # Example
//!
//! ```
//! use clchain::core::types::BranchName;
//! use clchain::forge::mock::MockForge;
//! use clchain::forge::{Forge, PushRequest};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//! let request = PushRequest {
//!     remote: "origin".to_string(),
//!     branch: BranchName::new("feature-REVIEW").unwrap(),
//!     reference: "refs/for/master".to_string(),
//!     verify: true,
//! };
//!
//! forge.push(&request).await.unwrap();
//! assert_eq!(forge.pushes(), vec![request]);
//! # });
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{Forge, ForgeError, PushOutcome, PushRequest};
use crate::core::types::ChangeId;

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug, Default)]
struct MockForgeInner {
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
    remote_lines: Vec<String>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    Push(ForgeError),
    SetTopic(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Push(PushRequest),
    SetTopic { change_id: String, topic: String },
}

impl MockForge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given operation fail from now on.
    pub fn fail_on(&self, fail: FailOn) {
        self.lock().fail_on = Some(fail);
    }

    /// Server output returned by successful pushes.
    pub fn with_remote_lines(self, lines: &[&str]) -> Self {
        self.lock().remote_lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// All recorded operations, in order. Failed attempts are recorded too.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    pub fn pushes(&self) -> Vec<PushRequest> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Push(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn topics(&self) -> Vec<(String, String)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::SetTopic { change_id, topic } => Some((change_id, topic)),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        // A panicking test thread must not hide the recorded operations.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn push(&self, request: &PushRequest) -> Result<PushOutcome, ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Push(request.clone()));
        if let Some(FailOn::Push(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        Ok(PushOutcome {
            remote_lines: inner.remote_lines.clone(),
        })
    }

    async fn set_topic(&self, change_id: &ChangeId, topic: &str) -> Result<(), ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::SetTopic {
            change_id: change_id.to_string(),
            topic: topic.to_string(),
        });
        if let Some(FailOn::SetTopic(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        Ok(())
    }
}
