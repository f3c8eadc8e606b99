//! forge::traits
//!
//! Forge trait definition for talking to the code-review server.
//!
//! # Design
//!
//! The `Forge` trait is async because both of its operations involve
//! network I/O: the upload is a `git push`, the topic is a REST call.
//! Commands drive it from a per-command tokio runtime.
//!
//! # Example
//!
//! ```ignore
//! use clchain::forge::{Forge, PushRequest};
//!
//! async fn upload(forge: &dyn Forge, request: &PushRequest) -> Result<(), ForgeError> {
//!     let outcome = forge.push(request).await?;
//!     for line in &outcome.remote_lines {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{BranchName, ChangeId};

/// Errors from forge operations.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// The server refused the upload. Carries the server's output verbatim.
    #[error("{0}")]
    PushRejected(String),

    /// The push could not be attempted at all.
    #[error("failed to run git push: {0}")]
    PushFailed(String),

    /// No review host is known for REST calls.
    #[error("review host not configured")]
    NoHost,

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// An upload of a review branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// Remote to push to
    pub remote: String,
    /// Local branch holding the single review commit
    pub branch: BranchName,
    /// Magic target ref, e.g. `refs/for/master%r=alice`
    pub reference: String,
    /// Run the local pre-push hook
    pub verify: bool,
}

impl PushRequest {
    /// The `<src>:<dst>` refspec handed to `git push`.
    pub fn refspec(&self) -> String {
        format!("{}:{}", self.branch, self.reference)
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Lines of server output starting with `remote:`
    pub remote_lines: Vec<String>,
}

/// The Forge trait for interacting with the review server.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Human-readable name of this forge.
    fn name(&self) -> &'static str;

    /// Upload a review branch.
    ///
    /// # Errors
    ///
    /// [`ForgeError::PushRejected`] when the server refuses the change.
    async fn push(&self, request: &PushRequest) -> Result<PushOutcome, ForgeError>;

    /// Set the topic of an uploaded change.
    async fn set_topic(&self, change_id: &ChangeId, topic: &str) -> Result<(), ForgeError>;
}

/// Build the Gerrit magic reference for an upload.
///
/// # Example
///
/// ```
/// use clchain::core::types::BranchName;
/// use clchain::forge::review_reference;
///
/// let master = BranchName::new("master").unwrap();
/// assert_eq!(review_reference(&master, false, &[], &[]), "refs/for/master");
/// assert_eq!(
///     review_reference(&master, true, &["a".into()], &["c".into()]),
///     "refs/drafts/master%r=a,cc=c"
/// );
/// ```
pub fn review_reference(
    upstream: &BranchName,
    draft: bool,
    reviewers: &[String],
    ccs: &[String],
) -> String {
    let namespace = if draft { "drafts" } else { "for" };
    let mut reference = format!("refs/{}/{}", namespace, upstream);

    let params: Vec<String> = reviewers
        .iter()
        .map(|r| format!("r={}", r))
        .chain(ccs.iter().map(|c| format!("cc={}", c)))
        .collect();
    if !params.is_empty() {
        reference.push('%');
        reference.push_str(&params.join(","));
    }
    reference
}
