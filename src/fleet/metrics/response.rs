//! First-response latency extraction
//!
//! For each sampled issue or PR the collector fetches the first comment;
//! response time is `first_comment.created_at - item.created_at`. Items that
//! never received a response are excluded from the average's denominator —
//! they are not counted as zero.

use serde::Serialize;

use crate::fleet::github::models::{IssueRecord, ItemKind, RawComment};
use crate::fleet::metrics::mean_ms;

/// One sampled item paired with its first response, if it got one
#[derive(Debug, Clone)]
pub struct FirstResponse {
    pub item: IssueRecord,
    pub response: Option<RawComment>,
}

impl FirstResponse {
    /// Milliseconds from creation to first response, when a response exists
    pub fn response_time_ms(&self) -> Option<f64> {
        self.response
            .as_ref()
            .map(|c| (c.created_at - self.item.created_at).num_milliseconds() as f64)
    }
}

/// Average first-response latency for one repository, split by item kind
///
/// `0.0` means "no responded samples" as well as a literal zero latency;
/// the sample counts disambiguate for callers that care.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseLatency {
    pub avg_issue_response_ms: f64,
    pub avg_pr_response_ms: f64,
    pub issue_samples: usize,
    pub pr_samples: usize,
}

/// Computes per-kind response latency from the sampled first responses
pub fn response_latency(samples: &[FirstResponse]) -> ResponseLatency {
    let mut issue_times = Vec::new();
    let mut pr_times = Vec::new();

    for sample in samples {
        let Some(ms) = sample.response_time_ms() else {
            continue;
        };
        match sample.item.kind {
            ItemKind::Issue => issue_times.push(ms),
            ItemKind::PullRequest => pr_times.push(ms),
        }
    }

    ResponseLatency {
        avg_issue_response_ms: mean_ms(&issue_times),
        avg_pr_response_ms: mean_ms(&pr_times),
        issue_samples: issue_times.len(),
        pr_samples: pr_times.len(),
    }
}
