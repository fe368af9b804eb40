//! Per-family metric extractors
//!
//! One module per metric family. Every extractor is a pure function of
//! `(repository ref, windowed raw records, pre-fetched detail records)` —
//! all IO happens in the collector, which hands the extractors exactly the
//! data the sampling policy allowed it to fetch.
//!
//! Shared edge-case policy: a metric whose denominator is zero reports `0`,
//! never NaN. Duration metrics with no qualifying samples report `0.0` ms,
//! which the presentation layer renders as "N/A" — the same sentinel also
//! means a genuine zero-millisecond duration, a conflation inherited from
//! the snapshot format and deliberately left in place.

pub mod ci;
pub mod contributors;
pub mod issues;
pub mod maintainers;
pub mod pulls;
pub mod response;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::{IssueRecord, ItemKind};

/// PR size distribution over fixed changed-line thresholds
///
/// Buckets: xs `<50`, s `50-200`, m `200-500`, l `500-1000`, xl `>=1000`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDistribution {
    pub xs: u64,
    pub s: u64,
    pub m: u64,
    pub l: u64,
    pub xl: u64,
}

impl SizeDistribution {
    /// Buckets one PR by its total changed lines
    pub fn add(&mut self, changed_lines: u64) {
        if changed_lines < 50 {
            self.xs += 1;
        } else if changed_lines < 200 {
            self.s += 1;
        } else if changed_lines < 500 {
            self.m += 1;
        } else if changed_lines < 1000 {
            self.l += 1;
        } else {
            self.xl += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.xs + self.s + self.m + self.l + self.xl
    }

    /// Sums another distribution into this one
    pub fn merge(&mut self, other: &SizeDistribution) {
        self.xs += other.xs;
        self.s += other.s;
        self.m += other.m;
        self.l += other.l;
        self.xl += other.xl;
    }
}

/// Open-issue age distribution over fixed day thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeDistribution {
    #[serde(rename = "0-7d")]
    pub d0_7: u64,
    #[serde(rename = "7-30d")]
    pub d7_30: u64,
    #[serde(rename = "30-90d")]
    pub d30_90: u64,
    #[serde(rename = "90d+")]
    pub d90_plus: u64,
}

impl AgeDistribution {
    /// Buckets one open item by its age in whole days
    pub fn add(&mut self, age_days: i64) {
        if age_days < 7 {
            self.d0_7 += 1;
        } else if age_days < 30 {
            self.d7_30 += 1;
        } else if age_days < 90 {
            self.d30_90 += 1;
        } else {
            self.d90_plus += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.d0_7 + self.d7_30 + self.d30_90 + self.d90_plus
    }

    pub fn merge(&mut self, other: &AgeDistribution) {
        self.d0_7 += other.d0_7;
        self.d7_30 += other.d7_30;
        self.d30_90 += other.d30_90;
        self.d90_plus += other.d90_plus;
    }
}

/// Percentage helper honouring the shared zero-denominator policy
pub(crate) fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Mean of a duration sample set; `0.0` when there are no samples
pub(crate) fn mean_ms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

/// Overview health record for one repository
///
/// Combines contributor activity, first-response latency and PR throughput
/// into the per-repo row of the main dashboard table. The login sets ride
/// along because fleet totals are set unions, not sums.
#[derive(Debug, Clone, Serialize)]
pub struct RepoActivityHealth {
    pub repo: RepositoryRef,
    pub contributor_logins: std::collections::BTreeSet<String>,
    pub new_contributor_logins: std::collections::BTreeSet<String>,

    /// `0.0` when no sampled issue received a response
    pub avg_issue_response_ms: f64,
    /// `0.0` when no sampled PR received a response
    pub avg_pr_response_ms: f64,

    pub pr_merge_rate: f64,
    pub open_issues: usize,
    pub open_prs: usize,
}

impl RepoActivityHealth {
    pub fn contributors(&self) -> usize {
        self.contributor_logins.len()
    }

    pub fn new_contributors(&self) -> usize {
        self.new_contributor_logins.len()
    }
}

/// One row of the recent-activity feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub kind: ItemKind,
    pub repo: RepositoryRef,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: Option<String>,
}

impl ActivityEvent {
    pub fn from_record(repo: &RepositoryRef, record: &IssueRecord) -> Self {
        ActivityEvent {
            kind: record.kind,
            repo: repo.clone(),
            number: record.number,
            title: record.title.clone(),
            author: record.author.clone(),
            state: record.state.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            url: record.html_url.clone(),
        }
    }
}

/// Merges per-repo activity feeds: newest first, capped
pub fn merge_recent_activity(mut events: Vec<ActivityEvent>, cap: usize) -> Vec<ActivityEvent> {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    events.truncate(cap);
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bucket_thresholds() {
        let mut dist = SizeDistribution::default();
        for lines in [0, 49, 50, 199, 200, 499, 500, 999, 1000, 5000] {
            dist.add(lines);
        }
        assert_eq!(dist.xs, 2);
        assert_eq!(dist.s, 2);
        assert_eq!(dist.m, 2);
        assert_eq!(dist.l, 2);
        assert_eq!(dist.xl, 2);
        assert_eq!(dist.total(), 10);
    }

    #[test]
    fn test_age_bucket_thresholds() {
        let mut dist = AgeDistribution::default();
        for days in [0, 6, 7, 29, 30, 89, 90, 400] {
            dist.add(days);
        }
        assert_eq!(dist.d0_7, 2);
        assert_eq!(dist.d7_30, 2);
        assert_eq!(dist.d30_90, 2);
        assert_eq!(dist.d90_plus, 2);
    }

    #[test]
    fn test_age_distribution_serde_keys() {
        let mut dist = AgeDistribution::default();
        dist.add(3);
        dist.add(45);
        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["0-7d"], 1);
        assert_eq!(json["30-90d"], 1);
        assert_eq!(json["90d+"], 0);
    }

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_mean_ms_empty_is_sentinel_zero() {
        assert_eq!(mean_ms(&[]), 0.0);
        assert_eq!(mean_ms(&[100.0, 300.0]), 200.0);
    }
}
