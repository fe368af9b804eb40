//! Deterministic mock data generation
//!
//! Serves two purposes: the `--mock` collection mode, which substitutes a
//! generated per-repo dataset for live API calls, and the `gen-history`
//! command, which writes a backdated snapshot directory for trend charts.
//! Everything is driven by a seeded RNG so a given seed reproduces the same
//! dataset run after run.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::ItemKind;
use crate::fleet::history::{
    HistoricalSnapshot, RepoSnapshot, SnapshotIndex, SnapshotIssueMetrics,
    SnapshotMaintainerMetrics, SnapshotMetrics, SnapshotPrMetrics,
};
use crate::fleet::metrics::ci::{CiRun, CiWorkflowHealth};
use crate::fleet::metrics::issues::IssueHealth;
use crate::fleet::metrics::maintainers::MaintainerRecord;
use crate::fleet::metrics::pulls::PrHealth;
use crate::fleet::metrics::{ActivityEvent, AgeDistribution, RepoActivityHealth, SizeDistribution};

const HOUR_MS: f64 = 3_600_000.0;
const DAY_MS: f64 = 86_400_000.0;

/// Shared handle pool so repo contributor sets overlap, exercising the
/// set-union fleet totals the same way real shared contributors would
const CONTRIBUTOR_POOL: &[&str] = &[
    "mwillson", "avictor", "tnguyen", "jortega", "skang", "rpatel", "lbianchi", "dmoreau",
    "kfischer", "yilmazc", "pcosta", "hlarsen", "mbrandt", "aosei", "jwhitfield", "nsato",
    "fdelgado", "rkumar", "segan", "tmackay", "olindqvist", "bchoi", "gferraro", "dwaters",
    "mkova", "ahassan", "lnovak", "cduval", "jsteiner", "ryamada", "pmehta", "kbauer",
    "smorel", "tivanov", "njensen", "fortiz", "hwagner", "dclark", "mrossi", "abenali",
];

const MAINTAINER_POOL: &[&str] = &[
    "mwillson", "skang", "rpatel", "jortega", "hlarsen", "nsato", "rkumar", "bchoi", "dwaters",
    "lnovak", "kbauer", "tivanov",
];

const WORKFLOW_NAMES: &[&str] = &["CI", "Tests", "Lint", "Release", "Nightly Build"];

const ISSUE_TITLES: &[&str] = &[
    "Panic when config file is empty",
    "Document the retry policy",
    "Flaky timeout in integration suite",
    "Support custom base URL",
    "Reduce memory usage during sync",
    "Clarify error message on auth failure",
];

const PR_TITLES: &[&str] = &[
    "Fix pagination off-by-one",
    "Add structured logging to the worker",
    "Bump dependency versions",
    "Refactor request builder",
    "Handle rate-limit headers",
    "Add config validation",
];

/// Direction a metric drifts across generated history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Seeded generator for mock health records and snapshot history
pub struct MockGenerator {
    rng: StdRng,
}

impl MockGenerator {
    pub fn new(seed: u64) -> Self {
        MockGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick_logins(&mut self, count: usize) -> std::collections::BTreeSet<String> {
        CONTRIBUTOR_POOL
            .choose_multiple(&mut self.rng, count)
            .map(|s| s.to_string())
            .collect()
    }

    /// Mock overview row for one repository
    pub fn repo_activity(&mut self, repo: &RepositoryRef) -> RepoActivityHealth {
        let contributors = self.rng.gen_range(6..30);
        let new_contributors = self.rng.gen_range(0..=contributors / 4);
        let contributor_logins = self.pick_logins(contributors);
        let new_contributor_logins = contributor_logins
            .iter()
            .take(new_contributors)
            .cloned()
            .collect();

        RepoActivityHealth {
            repo: repo.clone(),
            contributor_logins,
            new_contributor_logins,
            avg_issue_response_ms: self.rng.gen_range(2.0..36.0) * HOUR_MS,
            avg_pr_response_ms: self.rng.gen_range(1.0..24.0) * HOUR_MS,
            pr_merge_rate: self.rng.gen_range(55.0..95.0),
            open_issues: self.rng.gen_range(3..60),
            open_prs: self.rng.gen_range(1..25),
        }
    }

    /// Mock PR health for one repository
    pub fn pr_health(&mut self, repo: &RepositoryRef) -> PrHealth {
        let total_prs = self.rng.gen_range(8..50);
        let mut size_distribution = SizeDistribution::default();
        for _ in 0..total_prs {
            // Log-ish spread keeps most PRs small, as real repos skew
            let lines: u64 = match self.rng.gen_range(0..10) {
                0..=4 => self.rng.gen_range(1..50),
                5..=7 => self.rng.gen_range(50..500),
                8 => self.rng.gen_range(500..1000),
                _ => self.rng.gen_range(1000..4000),
            };
            size_distribution.add(lines);
        }

        PrHealth {
            repo: repo.clone(),
            avg_review_time_ms: self.rng.gen_range(2.0..48.0) * HOUR_MS,
            avg_merge_time_ms: self.rng.gen_range(0.5..7.0) * DAY_MS,
            avg_revisions: self.rng.gen_range(1.0..6.0),
            merge_rate: self.rng.gen_range(55.0..95.0),
            total_prs,
            open_prs: self.rng.gen_range(1..25),
            size_distribution,
        }
    }

    /// Mock issue health for one repository
    pub fn issue_health(&mut self, repo: &RepositoryRef) -> IssueHealth {
        let open_issues = self.rng.gen_range(3..60);
        let mut age_distribution = AgeDistribution::default();
        for _ in 0..open_issues {
            age_distribution.add(self.rng.gen_range(0..200));
        }

        IssueHealth {
            repo: repo.clone(),
            closure_rate: self.rng.gen_range(40.0..90.0),
            avg_time_to_close_ms: self.rng.gen_range(2.0..21.0) * DAY_MS,
            avg_time_to_first_response_ms: self.rng.gen_range(2.0..36.0) * HOUR_MS,
            response_coverage: self.rng.gen_range(50.0..100.0),
            avg_comments_per_issue: self.rng.gen_range(1.0..8.0),
            open_issues,
            age_distribution,
        }
    }

    /// Mock ranked maintainer records
    ///
    /// Response counts follow a power law (each rank carries 70% of the
    /// previous one) so the concentration and burnout metrics see the same
    /// skew a real maintainer fleet shows.
    pub fn maintainer_records(&mut self, count: usize) -> Vec<MaintainerRecord> {
        let count = count.min(MAINTAINER_POOL.len());
        let base = self.rng.gen_range(80..160) as f64;

        let counts: Vec<u64> = (0..count)
            .map(|rank| (base * 0.7f64.powi(rank as i32)).round().max(1.0) as u64)
            .collect();
        let total: u64 = counts.iter().sum();

        counts
            .iter()
            .enumerate()
            .map(|(rank, &response_count)| {
                let issue_responses = self.rng.gen_range(0..=response_count);
                MaintainerRecord {
                    username: MAINTAINER_POOL[rank].to_string(),
                    response_count,
                    issue_responses,
                    pr_responses: response_count - issue_responses,
                    avg_response_time_ms: self.rng.gen_range(1.0..24.0) * HOUR_MS,
                    repo_count: self.rng.gen_range(1..=4),
                    response_share: response_count as f64 / total as f64 * 100.0,
                }
            })
            .collect()
    }

    /// Mock workflow health rows for one repository
    pub fn workflow_healths(&mut self, repo: &RepositoryRef, now: DateTime<Utc>) -> Vec<CiWorkflowHealth> {
        let workflow_count = self.rng.gen_range(2..=4);
        let names: Vec<&str> = WORKFLOW_NAMES
            .choose_multiple(&mut self.rng, workflow_count)
            .copied()
            .collect();
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let total_runs = self.rng.gen_range(5..60);
                let success_rate = self.rng.gen_range(70.0..100.0);
                let recent_runs: Vec<CiRun> = (0..total_runs.min(10))
                    .map(|n| CiRun {
                        id: self.rng.gen_range(1_000_000..9_000_000),
                        branch: "main".to_string(),
                        conclusion: if self.rng.gen_range(0.0..100.0) < success_rate {
                            "success".to_string()
                        } else {
                            "failure".to_string()
                        },
                        created_at: now - Duration::hours(6 * (n as i64 + 1)),
                        duration_ms: self.rng.gen_range(2.0..20.0) * 60_000.0,
                        triggered_by: CONTRIBUTOR_POOL
                            .choose(&mut self.rng)
                            .unwrap_or(&"mwillson")
                            .to_string(),
                    })
                    .collect();

                CiWorkflowHealth {
                    repo: repo.clone(),
                    workflow_id: (i as u64 + 1) * 1000,
                    name: name.to_string(),
                    branch: "main".to_string(),
                    status: recent_runs
                        .first()
                        .map(|r| r.conclusion.clone())
                        .unwrap_or_else(|| "success".to_string()),
                    last_run_at: now - Duration::hours(6),
                    avg_duration_ms: self.rng.gen_range(2.0..20.0) * 60_000.0,
                    success_rate,
                    total_runs,
                    recent_runs,
                }
            })
            .collect()
    }

    /// Mock recent-activity feed rows for one repository
    pub fn recent_activity(&mut self, repo: &RepositoryRef, now: DateTime<Utc>) -> Vec<ActivityEvent> {
        let count = self.rng.gen_range(3..=8);
        (0..count)
            .map(|_| {
                let kind = if self.rng.gen_bool(0.5) {
                    ItemKind::Issue
                } else {
                    ItemKind::PullRequest
                };
                let titles = match kind {
                    ItemKind::Issue => ISSUE_TITLES,
                    ItemKind::PullRequest => PR_TITLES,
                };
                let created_at = now - Duration::hours(self.rng.gen_range(1..24 * 7));
                ActivityEvent {
                    kind,
                    repo: repo.clone(),
                    number: self.rng.gen_range(100..5000),
                    title: titles.choose(&mut self.rng).unwrap_or(&"Untitled").to_string(),
                    author: CONTRIBUTOR_POOL
                        .choose(&mut self.rng)
                        .unwrap_or(&"mwillson")
                        .to_string(),
                    state: if self.rng.gen_bool(0.7) {
                        "open".to_string()
                    } else {
                        "closed".to_string()
                    },
                    created_at,
                    updated_at: created_at + Duration::hours(self.rng.gen_range(0..48)),
                    url: None,
                }
            })
            .collect()
    }

    /// Applies a trend curve plus jitter to a base value
    ///
    /// `progress` runs 0.0 at the oldest day to 1.0 at the newest. Increasing
    /// metrics ramp from 70% to 130% of base across the span, decreasing ones
    /// the reverse, stable ones hold at 100%; all get ±10% day jitter.
    fn trended(&mut self, base: f64, trend: Trend, progress: f64) -> f64 {
        let factor = match trend {
            Trend::Increasing => 0.7 + 0.6 * progress,
            Trend::Decreasing => 1.3 - 0.6 * progress,
            Trend::Stable => 1.0,
        };
        let jitter = self.rng.gen_range(-0.1..0.1);
        (base * factor * (1.0 + jitter)).max(0.0)
    }

    /// One backdated snapshot at the given progress through the span
    pub fn snapshot(
        &mut self,
        date: NaiveDate,
        progress: f64,
        repositories: &[RepositoryRef],
    ) -> HistoricalSnapshot {
        let repo_count = repositories.len().max(1) as f64;
        let total_contributors = self.trended(140.0, Trend::Increasing, progress);
        let open_issues = self.trended(35.0 * repo_count, Trend::Stable, progress);
        let open_prs = self.trended(12.0 * repo_count, Trend::Stable, progress);

        let repo_rows: Vec<RepoSnapshot> = repositories
            .iter()
            .map(|repo| RepoSnapshot {
                org: repo.org.clone(),
                repo: repo.name.clone(),
                contributors: self.trended(total_contributors / repo_count, Trend::Stable, progress)
                    .round(),
                new_contributors: self.trended(4.0, Trend::Stable, progress).round(),
                avg_issue_response_ms: self.trended(10.0 * HOUR_MS, Trend::Decreasing, progress),
                avg_pr_response_ms: self.trended(6.0 * HOUR_MS, Trend::Decreasing, progress),
                pr_merge_rate: self.trended(72.0, Trend::Increasing, progress).min(100.0),
                open_issues: self.trended(35.0, Trend::Stable, progress).round(),
                open_prs: self.trended(12.0, Trend::Stable, progress).round(),
            })
            .collect();

        HistoricalSnapshot {
            date,
            timestamp: date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()),
            repositories: repo_rows,
            metrics: Some(SnapshotMetrics {
                total_contributors: total_contributors.round(),
                new_contributors: self.trended(18.0, Trend::Increasing, progress).round(),
                avg_response_time: self.trended(8.0 * HOUR_MS, Trend::Decreasing, progress),
                avg_issue_response: self.trended(10.0 * HOUR_MS, Trend::Decreasing, progress),
                avg_pr_response: self.trended(6.0 * HOUR_MS, Trend::Decreasing, progress),
                pr_merge_rate: self.trended(72.0, Trend::Increasing, progress).min(100.0),
                open_issues: open_issues.round(),
                open_prs: open_prs.round(),
                repositories: repositories.len() as f64,
            }),
            pr_metrics: Some(SnapshotPrMetrics {
                avg_review_time: self.trended(20.0 * HOUR_MS, Trend::Decreasing, progress),
                avg_merge_time: self.trended(3.0 * DAY_MS, Trend::Decreasing, progress),
                avg_revisions: self.trended(3.0, Trend::Stable, progress),
            }),
            issue_metrics: Some(SnapshotIssueMetrics {
                closure_rate: self.trended(65.0, Trend::Increasing, progress).min(100.0),
                avg_time_to_close: self.trended(8.0 * DAY_MS, Trend::Decreasing, progress),
                avg_time_to_first_response: self.trended(10.0 * HOUR_MS, Trend::Decreasing, progress),
                response_coverage: self.trended(75.0, Trend::Increasing, progress).min(100.0),
                community_response_rate: self.trended(30.0, Trend::Increasing, progress).min(100.0),
            }),
            maintainer_metrics: Some(SnapshotMaintainerMetrics {
                active_maintainers: self.trended(9.0, Trend::Stable, progress).round().max(1.0),
                response_concentration: self
                    .trended(68.0, Trend::Decreasing, progress)
                    .clamp(0.0, 100.0),
            }),
        }
    }

    /// Writes `days` backdated snapshots plus `index.json` into `dir`
    ///
    /// The newest snapshot is dated `today`; files are named `YYYY-MM-DD.json`.
    pub fn write_history(
        &mut self,
        dir: &Path,
        days: u32,
        today: NaiveDate,
        repositories: &[RepositoryRef],
    ) -> Result<SnapshotIndex, String> {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;

        let mut dates = Vec::with_capacity(days as usize);
        for i in 0..days {
            let date = today - Duration::days((days - 1 - i) as i64);
            let progress = if days > 1 {
                i as f64 / (days - 1) as f64
            } else {
                1.0
            };
            let snapshot = self.snapshot(date, progress, repositories);

            let date_str = date.format("%Y-%m-%d").to_string();
            let path = dir.join(format!("{}.json", date_str));
            let body = serde_json::to_string_pretty(&snapshot)
                .map_err(|e| format!("Failed to serialize snapshot {}: {}", date_str, e))?;
            std::fs::write(&path, body)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            dates.push(date_str);
        }

        let index = SnapshotIndex {
            available_dates: dates,
        };
        let index_body = serde_json::to_string_pretty(&index)
            .map_err(|e| format!("Failed to serialize index: {}", e))?;
        let index_path = dir.join("index.json");
        std::fs::write(&index_path, index_body)
            .map_err(|e| format!("Failed to write {}: {}", index_path.display(), e))?;

        Ok(index)
    }
}
