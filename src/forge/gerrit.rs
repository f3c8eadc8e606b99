//! forge::gerrit
//!
//! Gerrit implementation of the [`Forge`] trait.
//!
//! Uploads are plain `git push` invocations to Gerrit's magic
//! `refs/for/<branch>` namespace. The topic is set through the REST API
//! (`PUT /changes/<id>/topic`), unauthenticated.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::traits::{Forge, ForgeError, PushOutcome, PushRequest};
use crate::core::types::ChangeId;

/// Gerrit forge.
#[derive(Debug, Clone)]
pub struct GerritForge {
    client: Client,
    /// Top-level directory pushes run from
    work_dir: PathBuf,
    /// Base URL of the server, e.g. `https://review.example.com`
    host: Option<String>,
}

#[derive(Serialize)]
struct TopicInput<'a> {
    topic: &'a str,
}

impl GerritForge {
    pub fn new(work_dir: impl Into<PathBuf>, host: Option<String>) -> Self {
        Self {
            client: Client::new(),
            work_dir: work_dir.into(),
            host: host.map(|h| h.trim_end_matches('/').to_string()),
        }
    }

    fn topic_url(&self, change_id: &ChangeId) -> Result<String, ForgeError> {
        let host = self.host.as_deref().ok_or(ForgeError::NoHost)?;
        Ok(format!("{}/changes/{}/topic", host, change_id))
    }
}

/// Review host derived from an http(s) remote URL.
///
/// Gerrit serves git and REST from the same origin, so
/// `https://review.example.com/project` yields `https://review.example.com`.
/// Other URL schemes (ssh, file paths) yield `None`.
///
/// # Example
///
/// ```
/// use clchain::forge::gerrit::host_from_remote_url;
///
/// assert_eq!(
///     host_from_remote_url("https://review.example.com/a/project.git"),
///     Some("https://review.example.com".to_string())
/// );
/// assert_eq!(host_from_remote_url("ssh://review.example.com:29418/p"), None);
/// ```
pub fn host_from_remote_url(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme != "http" && scheme != "https" {
        return None;
    }
    let authority = rest.split('/').next().filter(|a| !a.is_empty())?;
    // Drop any credentials embedded in the URL.
    let host = authority.rsplit('@').next().unwrap_or(authority);
    Some(format!("{}://{}", scheme, host))
}

#[async_trait]
impl Forge for GerritForge {
    fn name(&self) -> &'static str {
        "gerrit"
    }

    async fn push(&self, request: &PushRequest) -> Result<PushOutcome, ForgeError> {
        let refspec = request.refspec();
        let mut args = vec!["push"];
        if !request.verify {
            args.push("--no-verify");
        }
        args.push(request.remote.as_str());
        args.push(refspec.as_str());

        debug!(command = %format!("git {}", args.join(" ")), "pushing for review");
        let output = tokio::process::Command::new("git")
            .current_dir(&self.work_dir)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ForgeError::PushFailed(e.to_string()))?;

        // git reports progress and server messages on stderr.
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ForgeError::PushRejected(stderr.trim_end().to_string()));
        }

        let remote_lines = stderr
            .lines()
            .filter(|l| l.starts_with("remote:"))
            .map(str::to_string)
            .collect();
        Ok(PushOutcome { remote_lines })
    }

    async fn set_topic(&self, change_id: &ChangeId, topic: &str) -> Result<(), ForgeError> {
        let url = self.topic_url(change_id)?;
        debug!(url = %url, topic, "setting topic");

        let response = self
            .client
            .put(&url)
            .json(&TopicInput { topic })
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ForgeError::NotFound(format!("change {}", change_id)),
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message: message.trim().to_string(),
            },
        })
    }
}
