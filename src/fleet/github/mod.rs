//! Rate-aware GitHub API client
//!
//! Wraps outbound calls to the GitHub REST API with auth-header injection
//! and page-number pagination. The documented contract is a single attempt
//! per call — no retry, no backoff. Read-path callers use [`GithubClient::get_opt`],
//! which absorbs network errors, non-2xx statuses and malformed bodies into
//! `None` (logged at `warn`), so a failed call degrades to an empty record
//! set for that metric rather than aborting the load.
//!
//! # Authentication
//!
//! A bearer token is attached when configured; without one, requests run
//! against GitHub's anonymous quota (60 requests/hour instead of 5,000).

pub mod models;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::fleet::config::RepositoryRef;
use models::{
    IssueRecord, RawComment, RawCommit, RawIssue, RawPull, RawReview, RawWorkflow,
    RawWorkflowList, RawWorkflowRun, RawWorkflowRunList,
};

const USER_AGENT: &str = "fleethealth/0.1.0 (https://github.com/konveyor-ecosystem/fleethealth)";
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Maximum page size accepted by the GitHub list endpoints
const MAX_PER_PAGE: u32 = 100;

/// Scopes that grant write access to issues and pull requests
const WRITE_SCOPES: [&str; 4] = ["repo", "public_repo", "write:issues", "issues:write"];

/// Result of probing the configured token against the current-user endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccess {
    /// Whether destructive actions (closing items) should be offered
    pub has_write_access: bool,
}

/// HTTP client for the GitHub REST API
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(client: Client, token: Option<String>) -> Self {
        GithubClient {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
        }
    }

    /// Points the client at an alternative API root. Used by tests to target
    /// a local mock server.
    pub fn with_base_url(client: Client, token: Option<String>, base_url: impl Into<String>) -> Self {
        GithubClient {
            client,
            base_url: base_url.into(),
            token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Single-shot GET returning `None` on any failure
    ///
    /// This is the read-path entry point: transport errors, non-2xx statuses
    /// and undeserializable bodies all collapse to `None` after a `warn` log.
    /// The caller treats `None` as an empty record set for that call.
    pub async fn get_opt<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let response = match self.request(reqwest::Method::GET, path).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("GET {} failed: {}", path, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} returned {}", path, status);
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("GET {} returned an unparseable body: {}", path, e);
                None
            }
        }
    }

    /// Lists commits since a timestamp, one page of up to 100
    pub async fn list_commits(
        &self,
        repo: &RepositoryRef,
        since: DateTime<Utc>,
    ) -> Vec<RawCommit> {
        let path = format!(
            "/repos/{}/{}/commits?since={}&per_page={}",
            repo.org,
            repo.name,
            urlencoding::encode(&since.to_rfc3339()),
            MAX_PER_PAGE
        );
        self.get_opt(&path).await.unwrap_or_default()
    }

    /// Lists issues (and PRs, tagged at ingestion) updated since a timestamp
    ///
    /// Returns domain [`IssueRecord`]s; the issue-vs-PR marker is resolved
    /// here and never re-inspected downstream.
    pub async fn list_issues(
        &self,
        repo: &RepositoryRef,
        since: DateTime<Utc>,
        per_page: u32,
    ) -> Vec<IssueRecord> {
        let path = format!(
            "/repos/{}/{}/issues?state=all&since={}&per_page={}",
            repo.org,
            repo.name,
            urlencoding::encode(&since.to_rfc3339()),
            per_page.min(MAX_PER_PAGE)
        );
        let raw: Vec<RawIssue> = self.get_opt(&path).await.unwrap_or_default();
        raw.into_iter().map(RawIssue::into_record).collect()
    }

    /// Lists every open item carrying the `stale` label
    ///
    /// Unlike the metric fetchers this walks all pages, since the stale
    /// listing is a complete inventory rather than a sampled window. A
    /// failed page stops the walk and keeps the items already collected.
    pub async fn list_stale_items(&self, repo: &RepositoryRef) -> Vec<IssueRecord> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let path = format!(
                "/repos/{}/{}/issues?labels=stale&state=open&per_page={}&page={}",
                repo.org, repo.name, MAX_PER_PAGE, page
            );
            let raw: Vec<RawIssue> = match self.get_opt(&path).await {
                Some(raw) => raw,
                None => break,
            };
            if raw.is_empty() {
                break;
            }
            items.extend(raw.into_iter().map(RawIssue::into_record));
            page += 1;
        }
        items
    }

    /// Lists pull requests in all states, most recently updated first
    pub async fn list_pulls(&self, repo: &RepositoryRef) -> Vec<RawPull> {
        let path = format!(
            "/repos/{}/{}/pulls?state=all&per_page={}&sort=updated&direction=desc",
            repo.org, repo.name, MAX_PER_PAGE
        );
        self.get_opt(&path).await.unwrap_or_default()
    }

    /// Fetches the detail payload for one PR (carries additions/deletions/commits)
    pub async fn get_pull_detail(&self, repo: &RepositoryRef, number: u64) -> Option<RawPull> {
        let path = format!("/repos/{}/{}/pulls/{}", repo.org, repo.name, number);
        self.get_opt(&path).await
    }

    /// Fetches the first comment on an issue or PR, if any
    pub async fn first_issue_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Option<RawComment> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments?per_page=1",
            repo.org, repo.name, number
        );
        let comments: Vec<RawComment> = self.get_opt(&path).await.unwrap_or_default();
        comments.into_iter().next()
    }

    /// Lists reviews for one PR, in submission order
    pub async fn list_pull_reviews(&self, repo: &RepositoryRef, number: u64) -> Vec<RawReview> {
        let path = format!("/repos/{}/{}/pulls/{}/reviews", repo.org, repo.name, number);
        self.get_opt(&path).await.unwrap_or_default()
    }

    /// Lists active workflows for a repository
    pub async fn list_workflows(&self, repo: &RepositoryRef) -> Vec<RawWorkflow> {
        let path = format!("/repos/{}/{}/actions/workflows", repo.org, repo.name);
        let list: Option<RawWorkflowList> = self.get_opt(&path).await;
        list.map(|l| {
            l.workflows
                .into_iter()
                .filter(|w| w.state == "active")
                .collect()
        })
        .unwrap_or_default()
    }

    /// Lists runs for one workflow created after a timestamp
    pub async fn list_workflow_runs(
        &self,
        repo: &RepositoryRef,
        workflow_id: u64,
        created_after: DateTime<Utc>,
    ) -> Vec<RawWorkflowRun> {
        let path = format!(
            "/repos/{}/{}/actions/workflows/{}/runs?per_page=50&created={}",
            repo.org,
            repo.name,
            workflow_id,
            urlencoding::encode(&format!(">{}", created_after.to_rfc3339()))
        );
        let list: Option<RawWorkflowRunList> = self.get_opt(&path).await;
        list.map(|l| l.workflow_runs).unwrap_or_default()
    }

    /// Probes the configured token for write access
    ///
    /// Makes a one-time call to the current-user endpoint and inspects the
    /// `X-OAuth-Scopes` response header. Fine-grained tokens do not expose
    /// scopes at all; in that case write access is assumed and the close
    /// call will surface a 403 if the token is actually read-only.
    pub async fn probe_token_access(&self) -> TokenAccess {
        if self.token.is_none() {
            return TokenAccess {
                has_write_access: false,
            };
        }

        let response = match self.request(reqwest::Method::GET, "/user").send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Token permission probe failed: {}", e);
                return TokenAccess {
                    has_write_access: false,
                };
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Token permission probe returned {}", response.status());
            return TokenAccess {
                has_write_access: false,
            };
        }

        match response
            .headers()
            .get("X-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
        {
            Some(header) => {
                let has_write_access = parse_scopes_header(header);
                if has_write_access {
                    tracing::info!("GitHub token has write access for issues/PRs");
                } else {
                    tracing::info!(
                        "GitHub token lacks write access (scopes: {}); close actions disabled",
                        header
                    );
                }
                TokenAccess { has_write_access }
            }
            None => {
                tracing::info!(
                    "Token scopes not exposed (fine-grained token?); assuming write access"
                );
                TokenAccess {
                    has_write_access: true,
                }
            }
        }
    }

    /// Posts a comment on an issue or PR
    ///
    /// # Errors
    ///
    /// Unlike the read path, mutation failures are returned to the caller.
    pub async fn post_issue_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
        body: &str,
    ) -> Result<(), String> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments",
            repo.org, repo.name, number
        );
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| format!("Failed to post comment on #{}: {}", number, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Failed to post comment on #{}: {}", number, status));
        }
        Ok(())
    }

    /// Closes an issue or PR by patching its state
    pub async fn close_issue(&self, repo: &RepositoryRef, number: u64) -> Result<(), String> {
        let path = format!("/repos/{}/{}/issues/{}", repo.org, repo.name, number);
        let response = self
            .request(reqwest::Method::PATCH, &path)
            .json(&serde_json::json!({ "state": "closed" }))
            .send()
            .await
            .map_err(|e| format!("Failed to close #{}: {}", number, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Failed to close #{}: {}", number, status));
        }
        Ok(())
    }
}

/// Returns true when any scope in the comma-separated header grants writes
fn parse_scopes_header(header: &str) -> bool {
    header
        .split(',')
        .map(str::trim)
        .any(|scope| WRITE_SCOPES.contains(&scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes_header() {
        assert!(parse_scopes_header("repo, read:org"));
        assert!(parse_scopes_header("public_repo"));
        assert!(parse_scopes_header("gist, issues:write"));
        assert!(!parse_scopes_header("read:org, gist"));
        assert!(!parse_scopes_header(""));
        // Scope names must match exactly, not by prefix
        assert!(!parse_scopes_header("repository"));
    }
}
