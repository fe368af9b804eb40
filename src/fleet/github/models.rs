//! Raw GitHub REST payload types and their domain conversions
//!
//! The `Raw*` structs mirror the wire format of the endpoints the engine
//! consumes, deserialized with serde and kept private to the fetch layer
//! where possible. The one polymorphic payload — an "issue" that may really
//! be a pull request, signalled by the presence of a `pull_request` marker —
//! is disambiguated exactly once, at ingestion, into [`IssueRecord`] with an
//! explicit [`ItemKind`] tag. No downstream consumer re-checks the marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Whether an ingested item is a plain issue or a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    /// A plain issue (no pull-request marker on the wire)
    #[strum(serialize = "issue")]
    Issue,
    /// A pull request surfaced through the issues endpoint
    #[strum(serialize = "pr")]
    PullRequest,
}

/// Actor attached to commits, issues and runs
#[derive(Debug, Clone, Deserialize)]
pub struct RawActor {
    pub login: String,
}

/// One commit from `GET /repos/{org}/{repo}/commits`
#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    /// GitHub account of the author; absent for unmapped email addresses
    pub author: Option<RawActor>,
    pub commit: RawCommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitDetail {
    pub author: RawCommitAuthor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitAuthor {
    pub date: DateTime<Utc>,
}

/// Marker object whose mere presence flags an issue as a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullRequestMarker {
    #[serde(default)]
    pub url: Option<String>,
}

/// One item from `GET /repos/{org}/{repo}/issues` (issues and PRs mixed)
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: RawActor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Present iff this item is actually a pull request
    #[serde(default)]
    pub pull_request: Option<RawPullRequestMarker>,
}

impl RawIssue {
    /// Resolves the duck-typed payload into a tagged domain record.
    /// This is the only place the `pull_request` marker is inspected.
    pub fn into_record(self) -> IssueRecord {
        let kind = if self.pull_request.is_some() {
            ItemKind::PullRequest
        } else {
            ItemKind::Issue
        };
        IssueRecord {
            kind,
            number: self.number,
            title: self.title,
            state: self.state,
            author: self.user.login,
            created_at: self.created_at,
            updated_at: self.updated_at,
            closed_at: self.closed_at,
            comments: self.comments,
            html_url: self.html_url,
        }
    }
}

/// Tagged issue-or-PR record used by all extractors
#[derive(Debug, Clone, Serialize)]
pub struct IssueRecord {
    pub kind: ItemKind,
    pub number: u64,
    pub title: String,
    /// "open" or "closed" as reported by the API
    pub state: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub comments: u64,
    pub html_url: Option<String>,
}

impl IssueRecord {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

/// One pull request from `GET /repos/{org}/{repo}/pulls`
///
/// The list endpoint omits `additions`/`deletions`/`commits`; those arrive
/// only on the per-PR detail fetch, so they are optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPull {
    pub number: u64,
    pub state: String,
    pub user: RawActor,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
    #[serde(default)]
    pub commits: Option<u64>,
}

impl RawPull {
    /// Total changed lines, when the detail payload carried them
    pub fn changed_lines(&self) -> u64 {
        self.additions.unwrap_or(0) + self.deletions.unwrap_or(0)
    }
}

/// One comment from `GET /repos/{org}/{repo}/issues/{n}/comments`
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub user: RawActor,
    pub created_at: DateTime<Utc>,
}

/// One review from `GET /repos/{org}/{repo}/pulls/{n}/reviews`
#[derive(Debug, Clone, Deserialize)]
pub struct RawReview {
    pub user: Option<RawActor>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Workflow listing wrapper (`GET /repos/{org}/{repo}/actions/workflows`)
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowList {
    pub workflows: Vec<RawWorkflow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflow {
    pub id: u64,
    pub name: String,
    pub state: String,
}

/// Workflow run listing wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowRunList {
    pub workflow_runs: Vec<RawWorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowRun {
    pub id: u64,
    pub status: String,
    /// "success", "failure", etc.; None while the run is in progress
    #[serde(default)]
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub triggering_actor: Option<RawActor>,
}

impl RawWorkflowRun {
    /// Wall-clock duration in milliseconds, only when both endpoints exist
    pub fn duration_ms(&self) -> Option<f64> {
        self.updated_at
            .map(|end| (end - self.created_at).num_milliseconds() as f64)
    }
}
