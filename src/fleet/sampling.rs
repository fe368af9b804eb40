//! Sampling and windowing policy
//!
//! Every metric family looks back over a trailing time window, and the
//! families that need one extra detail call per record (first-comment and
//! per-PR review fetches) additionally cap how many windowed records are
//! inspected in depth. The cap bounds total API calls per load at the cost
//! of statistical completeness.
//!
//! The cap takes a *prefix* of the windowed, already-paginated result order,
//! not a random sample. Response-time metrics therefore reflect the most
//! recently fetched items rather than a uniform sample of the window — a
//! known, accepted bias.

use chrono::{DateTime, Duration, Utc};

use crate::fleet::config::MetricPeriods;

/// Number of issues per repository inspected for first-response latency
pub const ISSUE_SAMPLE_CAP: usize = 3;

/// Number of PRs per repository fetched in detail (size, reviews, revisions)
pub const PR_SAMPLE_CAP: usize = 20;

/// A lookback window paired with a detail-call cap
///
/// Recomputed from configuration on every load; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Trailing window length in days
    pub window_days: i64,

    /// Maximum windowed records inspected in per-item detail
    pub sample_cap: usize,
}

impl SamplingPolicy {
    pub fn new(window_days: i64, sample_cap: usize) -> Self {
        SamplingPolicy {
            window_days,
            sample_cap,
        }
    }

    /// Policy for the contributor-count window (no detail calls)
    pub fn contributors(periods: &MetricPeriods) -> Self {
        SamplingPolicy::new(periods.contributors, usize::MAX)
    }

    /// Sub-window for the "new contributor" subset
    pub fn new_contributors(periods: &MetricPeriods) -> Self {
        SamplingPolicy::new(periods.new_contributors, usize::MAX)
    }

    /// Policy for issue/PR first-response latency sampling
    pub fn response_time(periods: &MetricPeriods) -> Self {
        SamplingPolicy::new(periods.response_time, ISSUE_SAMPLE_CAP)
    }

    /// Policy for PR detail metrics (size, review latency, revisions)
    pub fn pr_details(periods: &MetricPeriods) -> Self {
        SamplingPolicy::new(periods.response_time, PR_SAMPLE_CAP)
    }

    /// Policy for the recent-activity feed (no detail calls)
    pub fn recent_activity(periods: &MetricPeriods) -> Self {
        SamplingPolicy::new(periods.recent_activity, usize::MAX)
    }

    /// Policy for CI workflow run health (no detail calls)
    pub fn ci_runs(periods: &MetricPeriods) -> Self {
        SamplingPolicy::new(periods.ci_runs, usize::MAX)
    }

    /// Start of the trailing window relative to `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.window_days)
    }

    /// Filters records to those created within the window, preserving order
    pub fn windowed<T>(
        &self,
        records: Vec<T>,
        created_at: impl Fn(&T) -> DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<T> {
        let start = self.window_start(now);
        records
            .into_iter()
            .filter(|r| created_at(r) >= start)
            .collect()
    }

    /// Takes the detail-inspection prefix of an already-windowed slice
    pub fn sample<'a, T>(&self, windowed: &'a [T]) -> &'a [T] {
        let cap = self.sample_cap.min(windowed.len());
        &windowed[..cap]
    }
}
