//! Cross-repository aggregation
//!
//! Merges the per-repository metric records into fleet-wide rollups.
//! Three rules hold everywhere:
//!
//! - Contributor totals are unions of the per-repo login sets, never sums;
//!   a person active in several repositories counts once.
//! - Rate-like metrics (merge rate, closure rate, success rate) are simple
//!   arithmetic means across repositories, not volume-weighted. A repo with
//!   2 PRs counts the same as one with 200 — a deliberate simplicity
//!   trade-off.
//! - Duration metrics average only over repositories that reported a
//!   non-zero sample; the `0.0` no-data sentinel is excluded from the
//!   denominator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::fleet::metrics::ci::{is_nightly, CiWorkflowHealth};
use crate::fleet::metrics::issues::IssueHealth;
use crate::fleet::metrics::maintainers::MaintainerRecord;
use crate::fleet::metrics::pulls::PrHealth;
use crate::fleet::metrics::{AgeDistribution, RepoActivityHealth, SizeDistribution};

/// Fleet-wide overview rollup
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetSummary {
    /// `|union of per-repo contributor sets|`
    pub total_contributors: usize,
    pub new_contributors: usize,

    pub avg_issue_response_ms: f64,
    pub avg_pr_response_ms: f64,
    /// Midpoint of the issue and PR averages
    pub avg_response_time_ms: f64,

    /// Simple mean of per-repo merge rates
    pub pr_merge_rate: f64,

    pub open_issues: usize,
    pub open_prs: usize,
    pub repositories: usize,
}

/// Mean over the non-zero entries only; `0.0` when none qualify
fn nonzero_mean(values: impl Iterator<Item = f64>) -> f64 {
    let nonzero: Vec<f64> = values.filter(|v| *v > 0.0).collect();
    if nonzero.is_empty() {
        0.0
    } else {
        nonzero.iter().sum::<f64>() / nonzero.len() as f64
    }
}

/// Simple arithmetic mean; `0.0` for an empty input
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Rolls per-repository overview records up into a fleet summary
pub fn fleet_summary(records: &[RepoActivityHealth]) -> FleetSummary {
    let mut all_contributors: BTreeSet<&str> = BTreeSet::new();
    let mut all_new: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        all_contributors.extend(record.contributor_logins.iter().map(String::as_str));
        all_new.extend(record.new_contributor_logins.iter().map(String::as_str));
    }

    let avg_issue = nonzero_mean(records.iter().map(|r| r.avg_issue_response_ms));
    let avg_pr = nonzero_mean(records.iter().map(|r| r.avg_pr_response_ms));

    FleetSummary {
        total_contributors: all_contributors.len(),
        new_contributors: all_new.len(),
        avg_issue_response_ms: avg_issue,
        avg_pr_response_ms: avg_pr,
        avg_response_time_ms: (avg_issue + avg_pr) / 2.0,
        pr_merge_rate: mean(records.iter().map(|r| r.pr_merge_rate)),
        open_issues: records.iter().map(|r| r.open_issues).sum(),
        open_prs: records.iter().map(|r| r.open_prs).sum(),
        repositories: records.len(),
    }
}

/// Fleet-wide PR rollup
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrFleetSummary {
    pub merge_rate: f64,
    pub avg_review_time_ms: f64,
    pub avg_merge_time_ms: f64,
    pub avg_revisions: f64,
    pub total_prs: usize,
    pub open_prs: usize,
    pub size_distribution: SizeDistribution,
}

pub fn pr_fleet_summary(records: &[PrHealth]) -> PrFleetSummary {
    let mut size_distribution = SizeDistribution::default();
    for record in records {
        size_distribution.merge(&record.size_distribution);
    }

    PrFleetSummary {
        merge_rate: mean(records.iter().map(|r| r.merge_rate)),
        avg_review_time_ms: nonzero_mean(records.iter().map(|r| r.avg_review_time_ms)),
        avg_merge_time_ms: nonzero_mean(records.iter().map(|r| r.avg_merge_time_ms)),
        avg_revisions: nonzero_mean(records.iter().map(|r| r.avg_revisions)),
        total_prs: records.iter().map(|r| r.total_prs).sum(),
        open_prs: records.iter().map(|r| r.open_prs).sum(),
        size_distribution,
    }
}

/// Fleet-wide issue rollup
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueFleetSummary {
    pub closure_rate: f64,
    pub avg_time_to_close_ms: f64,
    pub avg_time_to_first_response_ms: f64,
    pub response_coverage: f64,
    pub avg_comments_per_issue: f64,
    pub open_issues: usize,
    pub age_distribution: AgeDistribution,
}

pub fn issue_fleet_summary(records: &[IssueHealth]) -> IssueFleetSummary {
    let mut age_distribution = AgeDistribution::default();
    for record in records {
        age_distribution.merge(&record.age_distribution);
    }

    IssueFleetSummary {
        closure_rate: mean(records.iter().map(|r| r.closure_rate)),
        avg_time_to_close_ms: nonzero_mean(records.iter().map(|r| r.avg_time_to_close_ms)),
        avg_time_to_first_response_ms: nonzero_mean(
            records.iter().map(|r| r.avg_time_to_first_response_ms),
        ),
        response_coverage: mean(records.iter().map(|r| r.response_coverage)),
        avg_comments_per_issue: nonzero_mean(records.iter().map(|r| r.avg_comments_per_issue)),
        open_issues: records.iter().map(|r| r.open_issues).sum(),
        age_distribution,
    }
}

/// Burnout-risk tier derived from the top-20% concentration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum BurnoutRisk {
    Low,
    Medium,
    High,
}

impl BurnoutRisk {
    /// Fixed thresholds: `>80` High, `>60` Medium, else Low
    pub fn from_concentration(concentration: f64) -> Self {
        if concentration > 80.0 {
            BurnoutRisk::High
        } else if concentration > 60.0 {
            BurnoutRisk::Medium
        } else {
            BurnoutRisk::Low
        }
    }
}

/// One point on the cumulative-share curve
#[derive(Debug, Clone, Serialize)]
pub struct CumulativeShare {
    /// 1-based rank position
    pub rank: usize,
    /// Running share of total responses, percent
    pub percent: f64,
}

/// Share of total responses held by the top `fraction` of maintainers
///
/// `records` must already be ranked (descending response count). The top
/// count is `ceil(fraction * len)`, so the value is monotonically
/// non-decreasing in `fraction` and reaches exactly 100 at `fraction = 1.0`.
pub fn top_share(records: &[MaintainerRecord], fraction: f64) -> f64 {
    let total: u64 = records.iter().map(|r| r.response_count).sum();
    if total == 0 {
        return 0.0;
    }
    let top_count = (records.len() as f64 * fraction).ceil() as usize;
    let top_responses: u64 = records
        .iter()
        .take(top_count)
        .map(|r| r.response_count)
        .sum();
    top_responses as f64 / total as f64 * 100.0
}

/// Cumulative response share per rank, for bus-factor visualization
pub fn cumulative_share(records: &[MaintainerRecord]) -> Vec<CumulativeShare> {
    let total: u64 = records.iter().map(|r| r.response_count).sum();
    if total == 0 {
        return Vec::new();
    }
    let mut running = 0u64;
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            running += record.response_count;
            CumulativeShare {
                rank: i + 1,
                percent: running as f64 / total as f64 * 100.0,
            }
        })
        .collect()
}

/// Fleet-wide maintainer rollup
#[derive(Debug, Clone, Serialize)]
pub struct MaintainerFleetSummary {
    pub active_maintainers: usize,
    pub total_responses: u64,

    /// Mean responses per maintainer, floored
    pub avg_response_load: u64,

    /// Top-20%-share concentration, percent
    pub concentration: f64,

    pub burnout_risk: BurnoutRisk,
    pub cumulative_share: Vec<CumulativeShare>,
}

pub fn maintainer_fleet_summary(ranked: &[MaintainerRecord]) -> MaintainerFleetSummary {
    let total_responses: u64 = ranked.iter().map(|r| r.response_count).sum();
    let concentration = top_share(ranked, 0.2);

    MaintainerFleetSummary {
        active_maintainers: ranked.len(),
        total_responses,
        avg_response_load: if ranked.is_empty() {
            0
        } else {
            total_responses / ranked.len() as u64
        },
        concentration,
        burnout_risk: BurnoutRisk::from_concentration(concentration),
        cumulative_share: cumulative_share(ranked),
    }
}

/// Fleet-wide CI rollup
#[derive(Debug, Clone, Default, Serialize)]
pub struct CiFleetSummary {
    /// Simple mean of per-workflow success rates
    pub success_rate: f64,
    pub avg_duration_ms: f64,

    /// Simple mean over the nightly workflow subset
    pub nightly_success_rate: f64,

    pub total_runs: usize,
    pub workflows: usize,
}

pub fn ci_fleet_summary(records: &[CiWorkflowHealth]) -> CiFleetSummary {
    let nightly: Vec<&CiWorkflowHealth> = records.iter().filter(|r| is_nightly(r)).collect();

    CiFleetSummary {
        success_rate: mean(records.iter().map(|r| r.success_rate)),
        avg_duration_ms: nonzero_mean(records.iter().map(|r| r.avg_duration_ms)),
        nightly_success_rate: mean(nightly.iter().map(|r| r.success_rate)),
        total_runs: records.iter().map(|r| r.total_runs).sum(),
        workflows: records.len(),
    }
}
