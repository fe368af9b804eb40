//! Historical snapshot loading and trend series
//!
//! An external batch job writes one snapshot file per day plus an
//! `index.json` listing the available dates. The loader reads the index,
//! loads each date independently — a missing or unparseable day is skipped
//! with a warning, never an error — sorts the survivors ascending by date
//! and caches the result for the session.
//!
//! Field names in the snapshot files are the stable producer/consumer
//! contract; the camelCase spellings below must not drift.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// `index.json` shape: the list of dates with a snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotIndex {
    pub available_dates: Vec<String>,
}

/// Per-repository breakdown entry inside a snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoSnapshot {
    pub org: String,
    pub repo: String,
    pub contributors: f64,
    #[serde(rename = "newContributors")]
    pub new_contributors: f64,
    #[serde(rename = "avgIssueResponseMs")]
    pub avg_issue_response_ms: f64,
    #[serde(rename = "avgPRResponseMs")]
    pub avg_pr_response_ms: f64,
    #[serde(rename = "prMergeRate")]
    pub pr_merge_rate: f64,
    #[serde(rename = "openIssues")]
    pub open_issues: f64,
    #[serde(rename = "openPRs")]
    pub open_prs: f64,
}

/// `metrics` group: overview rollup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotMetrics {
    #[serde(rename = "totalContributors")]
    pub total_contributors: f64,
    #[serde(rename = "newContributors")]
    pub new_contributors: f64,
    #[serde(rename = "avgResponseTime")]
    pub avg_response_time: f64,
    #[serde(rename = "avgIssueResponse")]
    pub avg_issue_response: f64,
    #[serde(rename = "avgPRResponse")]
    pub avg_pr_response: f64,
    #[serde(rename = "prMergeRate")]
    pub pr_merge_rate: f64,
    #[serde(rename = "openIssues")]
    pub open_issues: f64,
    #[serde(rename = "openPRs")]
    pub open_prs: f64,
    pub repositories: f64,
}

/// `prMetrics` group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPrMetrics {
    #[serde(rename = "avgReviewTime")]
    pub avg_review_time: f64,
    #[serde(rename = "avgMergeTime")]
    pub avg_merge_time: f64,
    #[serde(rename = "avgRevisions")]
    pub avg_revisions: f64,
}

/// `issueMetrics` group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotIssueMetrics {
    #[serde(rename = "closureRate")]
    pub closure_rate: f64,
    #[serde(rename = "avgTimeToClose")]
    pub avg_time_to_close: f64,
    #[serde(rename = "avgTimeToFirstResponse")]
    pub avg_time_to_first_response: f64,
    #[serde(rename = "responseCoverage")]
    pub response_coverage: f64,
    #[serde(rename = "communityResponseRate")]
    pub community_response_rate: f64,
}

/// `maintainerMetrics` group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotMaintainerMetrics {
    #[serde(rename = "activeMaintainers")]
    pub active_maintainers: f64,
    #[serde(rename = "responseConcentration")]
    pub response_concentration: f64,
}

/// One immutable daily metrics bundle
///
/// Every nested group is optional so that older or partial snapshot files
/// still load; series extraction defaults missing groups to `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalSnapshot {
    /// Calendar day, the unique key; series order is ascending by this field
    pub date: NaiveDate,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub repositories: Vec<RepoSnapshot>,

    #[serde(default)]
    pub metrics: Option<SnapshotMetrics>,

    #[serde(rename = "prMetrics", default)]
    pub pr_metrics: Option<SnapshotPrMetrics>,

    #[serde(rename = "issueMetrics", default)]
    pub issue_metrics: Option<SnapshotIssueMetrics>,

    #[serde(rename = "maintainerMetrics", default)]
    pub maintainer_metrics: Option<SnapshotMaintainerMetrics>,
}

/// Trailing period filter for trend charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum TrendPeriod {
    #[strum(serialize = "30")]
    Last30,
    #[strum(serialize = "60")]
    Last60,
    #[strum(serialize = "90")]
    Last90,
    #[strum(serialize = "all")]
    All,
}

impl TrendPeriod {
    fn days(&self) -> Option<i64> {
        match self {
            TrendPeriod::Last30 => Some(30),
            TrendPeriod::Last60 => Some(60),
            TrendPeriod::Last90 => Some(90),
            TrendPeriod::All => None,
        }
    }
}

/// Selectable trend series, each mapping a snapshot to one number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum TrendSeries {
    Contributors,
    /// Open issues + open PRs
    Activity,
    ResponseTime,
    MergeRate,
    ReviewTime,
    MergeTime,
    ClosureRate,
    MaintainerCount,
    Concentration,
}

impl TrendSeries {
    /// Extracts this series' value from one snapshot, defaulting missing
    /// nested groups to `0`
    pub fn value(&self, snapshot: &HistoricalSnapshot) -> f64 {
        let metrics = snapshot.metrics.as_ref();
        let pr = snapshot.pr_metrics.as_ref();
        let issue = snapshot.issue_metrics.as_ref();
        let maintainer = snapshot.maintainer_metrics.as_ref();
        match self {
            TrendSeries::Contributors => metrics.map_or(0.0, |m| m.total_contributors),
            TrendSeries::Activity => metrics.map_or(0.0, |m| m.open_issues + m.open_prs),
            TrendSeries::ResponseTime => metrics.map_or(0.0, |m| m.avg_response_time),
            TrendSeries::MergeRate => metrics.map_or(0.0, |m| m.pr_merge_rate),
            TrendSeries::ReviewTime => pr.map_or(0.0, |m| m.avg_review_time),
            TrendSeries::MergeTime => pr.map_or(0.0, |m| m.avg_merge_time),
            TrendSeries::ClosureRate => issue.map_or(0.0, |m| m.closure_rate),
            TrendSeries::MaintainerCount => maintainer.map_or(0.0, |m| m.active_maintainers),
            TrendSeries::Concentration => maintainer.map_or(0.0, |m| m.response_concentration),
        }
    }
}

/// Filters snapshots to `date >= today - period`, keeping ascending order.
/// `All` is the identity filter.
pub fn filter_by_period(
    snapshots: &[HistoricalSnapshot],
    period: TrendPeriod,
    today: NaiveDate,
) -> Vec<HistoricalSnapshot> {
    match period.days() {
        None => snapshots.to_vec(),
        Some(days) => {
            let cutoff = today - chrono::Duration::days(days);
            snapshots
                .iter()
                .filter(|s| s.date >= cutoff)
                .cloned()
                .collect()
        }
    }
}

/// Maps filtered snapshots to a dated numeric series
pub fn series_points(
    snapshots: &[HistoricalSnapshot],
    series: TrendSeries,
) -> Vec<(NaiveDate, f64)> {
    snapshots
        .iter()
        .map(|s| (s.date, series.value(s)))
        .collect()
}

/// Loads historical snapshots from a directory, caching for the session
pub struct TrendLoader {
    dir: PathBuf,
    cache: Option<Vec<HistoricalSnapshot>>,
}

impl TrendLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TrendLoader {
            dir: dir.into(),
            cache: None,
        }
    }

    /// Loads (or returns the cached) snapshot series, sorted ascending by date
    ///
    /// A missing index means no history has been generated yet and yields an
    /// empty series. Individual dates that fail to load are skipped with a
    /// warning; a missing day is simply absent from the series.
    pub fn load(&mut self) -> &[HistoricalSnapshot] {
        if self.cache.is_none() {
            self.cache = Some(load_snapshots(&self.dir));
        }
        self.cache.as_deref().unwrap_or(&[])
    }
}

fn load_snapshots(dir: &Path) -> Vec<HistoricalSnapshot> {
    let index_path = dir.join("index.json");
    let index: SnapshotIndex = match std::fs::read_to_string(&index_path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
    {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!(
                "Historical data index not available at {}: {}",
                index_path.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut snapshots: Vec<HistoricalSnapshot> = Vec::new();
    for date_str in &index.available_dates {
        let path = dir.join(format!("{}.json", date_str));
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                serde_json::from_str::<HistoricalSnapshot>(&raw).map_err(|e| e.to_string())
            }) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                tracing::warn!("Skipping snapshot {}: {}", date_str, e);
            }
        }
    }

    // Index order is not trusted; the series contract is ascending by date
    snapshots.sort_by_key(|s| s.date);
    snapshots
}
