//! Issue closure-rate and age extraction
//!
//! Operates on windowed issue records only (PRs are tagged out at
//! ingestion). Closure metrics cover the whole window; first-response
//! latency comes from the sampled subset the collector fetched comments for.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::{IssueRecord, ItemKind};
use crate::fleet::metrics::response::FirstResponse;
use crate::fleet::metrics::{mean_ms, percentage, AgeDistribution};

/// Issue health record for one repository
#[derive(Debug, Clone, Serialize)]
pub struct IssueHealth {
    pub repo: RepositoryRef,

    /// `closed / total-in-window * 100`; 0 when no issues in window
    pub closure_rate: f64,

    /// Mean time from creation to close over closed issues, ms
    pub avg_time_to_close_ms: f64,

    /// Mean first-response latency over the responded sample, ms
    pub avg_time_to_first_response_ms: f64,

    /// Share of windowed issues with at least one comment, percent
    pub response_coverage: f64,

    pub avg_comments_per_issue: f64,

    /// Currently open issues among the windowed set
    pub open_issues: usize,

    /// Age buckets over the open issues
    pub age_distribution: AgeDistribution,
}

/// Extracts issue health from windowed issues and the sampled first responses
///
/// `issues` must already be filtered to `ItemKind::Issue`; PR entries in
/// `samples` are ignored here (they feed the PR latency metric instead).
pub fn issue_health(
    repo: &RepositoryRef,
    issues: &[IssueRecord],
    samples: &[FirstResponse],
    now: DateTime<Utc>,
) -> IssueHealth {
    let closed: Vec<&IssueRecord> = issues.iter().filter(|i| !i.is_open()).collect();
    let open: Vec<&IssueRecord> = issues.iter().filter(|i| i.is_open()).collect();

    let close_times: Vec<f64> = closed
        .iter()
        .filter_map(|issue| {
            issue
                .closed_at
                .map(|closed_at| (closed_at - issue.created_at).num_milliseconds() as f64)
        })
        .collect();

    let response_times: Vec<f64> = samples
        .iter()
        .filter(|s| s.item.kind == ItemKind::Issue)
        .filter_map(|s| s.response_time_ms())
        .collect();

    let with_comments = issues.iter().filter(|i| i.comments > 0).count();
    let total_comments: u64 = issues.iter().map(|i| i.comments).sum();

    let mut age_distribution = AgeDistribution::default();
    for issue in &open {
        age_distribution.add((now - issue.created_at).num_days());
    }

    IssueHealth {
        repo: repo.clone(),
        closure_rate: percentage(closed.len(), issues.len()),
        avg_time_to_close_ms: mean_ms(&close_times),
        avg_time_to_first_response_ms: mean_ms(&response_times),
        response_coverage: percentage(with_comments, issues.len()),
        avg_comments_per_issue: if issues.is_empty() {
            0.0
        } else {
            total_comments as f64 / issues.len() as f64
        },
        open_issues: open.len(),
        age_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn issue(number: u64, age_days: i64, closed_after_days: Option<i64>, comments: u64) -> IssueRecord {
        let now = Utc::now();
        let created = now - Duration::days(age_days);
        IssueRecord {
            kind: ItemKind::Issue,
            number,
            title: format!("issue {}", number),
            state: if closed_after_days.is_some() {
                "closed".to_string()
            } else {
                "open".to_string()
            },
            author: "alice".to_string(),
            created_at: created,
            updated_at: created,
            closed_at: closed_after_days.map(|d| created + Duration::days(d)),
            comments,
            html_url: None,
        }
    }

    #[test]
    fn test_closure_rate_and_age_buckets() {
        let now = Utc::now();
        let repo = RepositoryRef::new("konveyor", "operator");
        let issues = vec![
            issue(1, 3, None, 0),
            issue(2, 40, None, 2),
            issue(3, 100, Some(10), 1),
            issue(4, 10, Some(2), 5),
        ];

        let health = issue_health(&repo, &issues, &[], now);
        assert_eq!(health.closure_rate, 50.0);
        assert_eq!(health.open_issues, 2);
        assert_eq!(health.age_distribution.d0_7, 1);
        assert_eq!(health.age_distribution.d30_90, 1);
        assert_eq!(health.age_distribution.total(), 2);
        // 3 of 4 issues have comments
        assert_eq!(health.response_coverage, 75.0);
        assert_eq!(health.avg_comments_per_issue, 2.0);
        // Mean of 10d and 2d to close
        assert_eq!(
            health.avg_time_to_close_ms,
            6.0 * 24.0 * 60.0 * 60.0 * 1000.0
        );
    }

    #[test]
    fn test_empty_window_reports_zeroes() {
        let repo = RepositoryRef::new("konveyor", "operator");
        let health = issue_health(&repo, &[], &[], Utc::now());
        assert_eq!(health.closure_rate, 0.0);
        assert_eq!(health.avg_time_to_close_ms, 0.0);
        assert_eq!(health.response_coverage, 0.0);
        assert_eq!(health.age_distribution.total(), 0);
        assert!(!health.closure_rate.is_nan());
    }
}
