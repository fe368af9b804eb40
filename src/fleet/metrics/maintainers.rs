//! Maintainer response-load extraction
//!
//! Each first-response event is attributed to its responder. Per-responder
//! counts are split by issue vs PR, averaged over response times, and ranked
//! by total response count. The ranking is the canonical maintainer order:
//! a stable descending sort, so responders with equal counts keep their
//! original encounter order.

use serde::Serialize;

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::ItemKind;
use crate::fleet::metrics::response::FirstResponse;

/// One attributed first-response event
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub responder: String,
    pub repo: RepositoryRef,
    pub kind: ItemKind,
    pub response_time_ms: f64,
}

/// Builds attributed response events from one repository's sampled responses
pub fn events_from_samples(repo: &RepositoryRef, samples: &[FirstResponse]) -> Vec<ResponseEvent> {
    samples
        .iter()
        .filter_map(|sample| {
            let response = sample.response.as_ref()?;
            let ms = sample.response_time_ms()?;
            Some(ResponseEvent {
                responder: response.user.login.clone(),
                repo: repo.clone(),
                kind: sample.item.kind,
                response_time_ms: ms,
            })
        })
        .collect()
}

/// Aggregated response load for one maintainer
#[derive(Debug, Clone, Serialize)]
pub struct MaintainerRecord {
    pub username: String,
    pub response_count: u64,
    pub issue_responses: u64,
    pub pr_responses: u64,
    pub avg_response_time_ms: f64,

    /// Distinct repositories this maintainer responded in
    pub repo_count: usize,

    /// `response_count / total responses * 100`; shares sum to 100 whenever
    /// any responses exist
    pub response_share: f64,
}

/// Accumulates events into ranked maintainer records
///
/// Output is sorted descending by `response_count` with a stable sort, and
/// `response_share` is normalized over the total event count.
pub fn maintainer_load(events: &[ResponseEvent]) -> Vec<MaintainerRecord> {
    struct Acc {
        username: String,
        response_count: u64,
        issue_responses: u64,
        pr_responses: u64,
        total_time_ms: f64,
        repos: Vec<RepositoryRef>,
    }

    // Vec keeps encounter order, which the stable sort preserves for ties
    let mut accs: Vec<Acc> = Vec::new();

    for event in events {
        let acc = match accs.iter_mut().find(|a| a.username == event.responder) {
            Some(acc) => acc,
            None => {
                accs.push(Acc {
                    username: event.responder.clone(),
                    response_count: 0,
                    issue_responses: 0,
                    pr_responses: 0,
                    total_time_ms: 0.0,
                    repos: Vec::new(),
                });
                accs.last_mut().unwrap()
            }
        };

        acc.response_count += 1;
        match event.kind {
            ItemKind::Issue => acc.issue_responses += 1,
            ItemKind::PullRequest => acc.pr_responses += 1,
        }
        acc.total_time_ms += event.response_time_ms;
        if !acc.repos.contains(&event.repo) {
            acc.repos.push(event.repo.clone());
        }
    }

    let total_responses: u64 = accs.iter().map(|a| a.response_count).sum();

    let mut records: Vec<MaintainerRecord> = accs
        .into_iter()
        .map(|acc| MaintainerRecord {
            response_share: if total_responses > 0 {
                acc.response_count as f64 / total_responses as f64 * 100.0
            } else {
                0.0
            },
            avg_response_time_ms: if acc.response_count > 0 {
                acc.total_time_ms / acc.response_count as f64
            } else {
                0.0
            },
            username: acc.username,
            response_count: acc.response_count,
            issue_responses: acc.issue_responses,
            pr_responses: acc.pr_responses,
            repo_count: acc.repos.len(),
        })
        .collect();

    records.sort_by(|a, b| b.response_count.cmp(&a.response_count));
    records
}
