//! Fleet health collection
//!
//! Orchestrates one full load: repositories are fetched concurrently (one
//! task per repo), per-item detail calls inside a repository run sequentially
//! with a short self-throttle, and the results are rolled up into a single
//! immutable [`FleetHealthReport`]. A failed fetch degrades to an empty
//! record set for that repository; the load itself never fails.
//!
//! Loads are numbered by a generation counter. A caller that starts a new
//! load while an old one is in flight checks [`HealthCollector::is_current`]
//! before applying the finished report and discards stale ones.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::fleet::aggregate::{
    ci_fleet_summary, fleet_summary, issue_fleet_summary, maintainer_fleet_summary,
    pr_fleet_summary, CiFleetSummary, FleetSummary, IssueFleetSummary, MaintainerFleetSummary,
    PrFleetSummary,
};
use crate::fleet::config::{DashboardConfig, MetricPeriods, RepositoryRef};
use crate::fleet::github::models::ItemKind;
use crate::fleet::github::GithubClient;
use crate::fleet::metrics::ci::{workflow_health, CiWorkflowHealth};
use crate::fleet::metrics::contributors::contributor_activity;
use crate::fleet::metrics::issues::{issue_health, IssueHealth};
use crate::fleet::metrics::maintainers::{events_from_samples, maintainer_load, MaintainerRecord, ResponseEvent};
use crate::fleet::metrics::pulls::{pr_health, PrDetailSample, PrHealth};
use crate::fleet::metrics::response::{response_latency, FirstResponse};
use crate::fleet::metrics::{merge_recent_activity, ActivityEvent, RepoActivityHealth};
use crate::fleet::mock::MockGenerator;
use crate::fleet::sampling::SamplingPolicy;

/// Pause between consecutive per-item detail calls within one repository
const DETAIL_CALL_DELAY: Duration = Duration::from_millis(100);

/// Fleet-wide recent-activity feed length
const RECENT_ACTIVITY_CAP: usize = 50;

/// Seed used when mock mode is enabled through configuration
const DEFAULT_MOCK_SEED: u64 = 42;

/// One complete, immutable load result
///
/// Built once per load and replaced wholesale; nothing mutates a report
/// after assembly.
#[derive(Debug, Clone, Serialize)]
pub struct FleetHealthReport {
    /// Load generation that produced this report
    pub generation: u64,
    pub generated_at: DateTime<Utc>,

    /// True when the mock generator substituted for live fetching
    pub mock: bool,

    pub repos: Vec<RepoActivityHealth>,
    pub summary: FleetSummary,

    pub pr_repos: Vec<PrHealth>,
    pub pr_summary: PrFleetSummary,

    pub issue_repos: Vec<IssueHealth>,
    pub issue_summary: IssueFleetSummary,

    /// Ranked descending by response count
    pub maintainers: Vec<MaintainerRecord>,
    pub maintainer_summary: MaintainerFleetSummary,

    pub ci_workflows: Vec<CiWorkflowHealth>,
    pub ci_summary: CiFleetSummary,

    /// Newest first, capped at 50 entries fleet-wide
    pub recent_activity: Vec<ActivityEvent>,
}

/// Everything collected for one repository before fleet rollup
struct RepoCollection {
    activity: RepoActivityHealth,
    pr: PrHealth,
    issue: IssueHealth,
    response_events: Vec<ResponseEvent>,
    ci: Vec<CiWorkflowHealth>,
    events: Vec<ActivityEvent>,
}

/// Collects fleet health reports on demand
pub struct HealthCollector {
    config: DashboardConfig,
    client: GithubClient,
    generation: AtomicU64,
}

impl HealthCollector {
    pub fn new(config: DashboardConfig) -> Self {
        let client = GithubClient::new(reqwest::Client::new(), config.github_token.clone());
        HealthCollector {
            config,
            client,
            generation: AtomicU64::new(0),
        }
    }

    /// Builds a collector over an existing client. Used by tests to target
    /// a mock server.
    pub fn with_client(config: DashboardConfig, client: GithubClient) -> Self {
        HealthCollector {
            config,
            client,
            generation: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &GithubClient {
        &self.client
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Starts a new load and returns its generation number
    ///
    /// Callers pass the number back to [`HealthCollector::is_current`] when
    /// the load finishes; a report from a superseded generation must be
    /// discarded, not applied.
    pub fn begin_load(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether the given generation is still the latest started load
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Runs one full load, honouring the configured mock switch
    pub async fn collect(&self) -> FleetHealthReport {
        if self.config.use_mock_data {
            self.collect_mock(DEFAULT_MOCK_SEED)
        } else {
            self.collect_live().await
        }
    }

    /// Runs one full live load against the GitHub API
    ///
    /// Repositories are collected concurrently; a panicked repo task is
    /// logged and its repository simply missing from the report.
    pub async fn collect_live(&self) -> FleetHealthReport {
        let generation = self.begin_load();
        let now = Utc::now();

        let mut set = JoinSet::new();
        for (index, repo) in self.config.repositories.iter().cloned().enumerate() {
            let client = self.client.clone();
            let periods = self.config.periods.clone();
            set.spawn(async move {
                let collection = collect_repo(&client, &periods, &repo, now).await;
                (index, collection)
            });
        }

        let mut indexed: Vec<(usize, RepoCollection)> = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => indexed.push(result),
                Err(e) => tracing::warn!("Repository collection task failed: {}", e),
            }
        }
        // Config order, not completion order
        indexed.sort_by_key(|(index, _)| *index);
        let collections: Vec<RepoCollection> =
            indexed.into_iter().map(|(_, c)| c).collect();

        assemble_report(generation, false, now, collections)
    }

    /// Runs one full mock load with a deterministic seed
    pub fn collect_mock(&self, seed: u64) -> FleetHealthReport {
        let generation = self.begin_load();
        let now = Utc::now();
        let mut generator = MockGenerator::new(seed);

        let mut repos = Vec::new();
        let mut pr_repos = Vec::new();
        let mut issue_repos = Vec::new();
        let mut ci_workflows = Vec::new();
        let mut events = Vec::new();
        for repo in &self.config.repositories {
            repos.push(generator.repo_activity(repo));
            pr_repos.push(generator.pr_health(repo));
            issue_repos.push(generator.issue_health(repo));
            ci_workflows.extend(generator.workflow_healths(repo, now));
            events.extend(generator.recent_activity(repo, now));
        }
        // An empty fleet yields no maintainers, matching the live path.
        let maintainers = if self.config.repositories.is_empty() {
            Vec::new()
        } else {
            generator.maintainer_records(10)
        };

        FleetHealthReport {
            generation,
            generated_at: now,
            mock: true,
            summary: fleet_summary(&repos),
            pr_summary: pr_fleet_summary(&pr_repos),
            issue_summary: issue_fleet_summary(&issue_repos),
            maintainer_summary: maintainer_fleet_summary(&maintainers),
            ci_summary: ci_fleet_summary(&ci_workflows),
            recent_activity: merge_recent_activity(events, RECENT_ACTIVITY_CAP),
            repos,
            pr_repos,
            issue_repos,
            maintainers,
            ci_workflows,
        }
    }
}

fn assemble_report(
    generation: u64,
    mock: bool,
    now: DateTime<Utc>,
    collections: Vec<RepoCollection>,
) -> FleetHealthReport {
    let mut repos = Vec::with_capacity(collections.len());
    let mut pr_repos = Vec::with_capacity(collections.len());
    let mut issue_repos = Vec::with_capacity(collections.len());
    let mut ci_workflows = Vec::new();
    let mut response_events = Vec::new();
    let mut events = Vec::new();

    for collection in collections {
        repos.push(collection.activity);
        pr_repos.push(collection.pr);
        issue_repos.push(collection.issue);
        ci_workflows.extend(collection.ci);
        response_events.extend(collection.response_events);
        events.extend(collection.events);
    }

    let maintainers = maintainer_load(&response_events);

    FleetHealthReport {
        generation,
        generated_at: now,
        mock,
        summary: fleet_summary(&repos),
        pr_summary: pr_fleet_summary(&pr_repos),
        issue_summary: issue_fleet_summary(&issue_repos),
        maintainer_summary: maintainer_fleet_summary(&maintainers),
        ci_summary: ci_fleet_summary(&ci_workflows),
        recent_activity: merge_recent_activity(events, RECENT_ACTIVITY_CAP),
        repos,
        pr_repos,
        issue_repos,
        maintainers,
        ci_workflows,
    }
}

/// Collects everything for one repository
///
/// List calls run first, then the per-item detail calls in sequence with
/// [`DETAIL_CALL_DELAY`] between them. Sampling takes the prefix of each
/// windowed list, so detail metrics lean toward the most recently updated
/// items; the caps bound API usage per load.
async fn collect_repo(
    client: &GithubClient,
    periods: &MetricPeriods,
    repo: &RepositoryRef,
    now: DateTime<Utc>,
) -> RepoCollection {
    tracing::debug!("Collecting {}", repo.full_name());

    // Contributors from the commit log
    let contributor_policy = SamplingPolicy::contributors(periods);
    let commits = client
        .list_commits(repo, contributor_policy.window_start(now))
        .await;
    let contributors = contributor_activity(
        repo,
        &commits,
        &SamplingPolicy::new_contributors(periods),
        now,
    );

    // Issues and PRs arrive on the same endpoint, tagged at ingestion
    let response_policy = SamplingPolicy::response_time(periods);
    let all_items = client
        .list_issues(repo, response_policy.window_start(now), 100)
        .await;
    let windowed_items =
        response_policy.windowed(all_items, |item| item.created_at, now);
    let issues: Vec<_> = windowed_items
        .iter()
        .filter(|i| i.kind == ItemKind::Issue)
        .cloned()
        .collect();
    let pr_items: Vec<_> = windowed_items
        .iter()
        .filter(|i| i.kind == ItemKind::PullRequest)
        .cloned()
        .collect();

    // First-response sampling, one comment fetch per sampled item
    let mut first_responses: Vec<FirstResponse> = Vec::new();
    for item in response_policy
        .sample(&issues)
        .iter()
        .chain(response_policy.sample(&pr_items).iter())
    {
        tokio::time::sleep(DETAIL_CALL_DELAY).await;
        let response = client.first_issue_comment(repo, item.number).await;
        first_responses.push(FirstResponse {
            item: item.clone(),
            response,
        });
    }
    let latency = response_latency(&first_responses);
    let response_events = events_from_samples(repo, &first_responses);

    // Pull requests: window for merge rate, sampled prefix for detail
    let pr_policy = SamplingPolicy::pr_details(periods);
    let pulls = client.list_pulls(repo).await;
    let open_prs = pulls.iter().filter(|p| p.state == "open").count();
    let windowed_pulls = pr_policy.windowed(pulls, |p| p.created_at, now);

    let mut pr_samples: Vec<PrDetailSample> = Vec::new();
    for pull in pr_policy.sample(&windowed_pulls) {
        tokio::time::sleep(DETAIL_CALL_DELAY).await;
        // List rows lack additions/deletions/commits; fall back to the list
        // row when the detail fetch fails
        let detail = client
            .get_pull_detail(repo, pull.number)
            .await
            .unwrap_or_else(|| pull.clone());
        tokio::time::sleep(DETAIL_CALL_DELAY).await;
        let reviews = client.list_pull_reviews(repo, pull.number).await;
        pr_samples.push(PrDetailSample {
            pull: detail,
            reviews,
        });
    }
    let pr = pr_health(repo, &windowed_pulls, open_prs, &pr_samples);

    let open_issues = issues.iter().filter(|i| i.is_open()).count();
    let issue = issue_health(repo, &issues, &first_responses, now);

    // CI workflow runs, one call per active workflow
    let ci_policy = SamplingPolicy::ci_runs(periods);
    let workflows = client.list_workflows(repo).await;
    let mut ci = Vec::new();
    for workflow in &workflows {
        tokio::time::sleep(DETAIL_CALL_DELAY).await;
        let runs = client
            .list_workflow_runs(repo, workflow.id, ci_policy.window_start(now))
            .await;
        if let Some(health) = workflow_health(repo, workflow, &runs) {
            ci.push(health);
        }
    }

    // Recent-activity feed over its own, shorter window
    let activity_policy = SamplingPolicy::recent_activity(periods);
    let activity_start = activity_policy.window_start(now);
    let events: Vec<ActivityEvent> = windowed_items
        .iter()
        .filter(|item| item.created_at >= activity_start)
        .map(|item| ActivityEvent::from_record(repo, item))
        .collect();

    let activity = RepoActivityHealth {
        repo: repo.clone(),
        contributor_logins: contributors.logins,
        new_contributor_logins: contributors.new_logins,
        avg_issue_response_ms: latency.avg_issue_response_ms,
        avg_pr_response_ms: latency.avg_pr_response_ms,
        pr_merge_rate: pr.merge_rate,
        open_issues,
        open_prs,
    };

    RepoCollection {
        activity,
        pr,
        issue,
        response_events,
        ci,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(repos: &[(&str, &str)]) -> DashboardConfig {
        DashboardConfig {
            repositories: repos
                .iter()
                .map(|(org, name)| RepositoryRef::new(*org, *name))
                .collect(),
            use_mock_data: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_generation_counter_advances() {
        let collector = HealthCollector::new(config(&[("acme", "engine")]));
        let first = collector.begin_load();
        let second = collector.begin_load();
        assert_eq!(second, first + 1);
        assert!(collector.is_current(second));
        assert!(!collector.is_current(first));
    }

    #[test]
    fn test_mock_report_covers_every_repo() {
        let collector = HealthCollector::new(config(&[("acme", "engine"), ("acme", "tools")]));
        let report = collector.collect_mock(7);

        assert!(report.mock);
        assert_eq!(report.repos.len(), 2);
        assert_eq!(report.pr_repos.len(), 2);
        assert_eq!(report.issue_repos.len(), 2);
        assert_eq!(report.summary.repositories, 2);
        assert!(!report.maintainers.is_empty());
        assert!(!report.ci_workflows.is_empty());
        assert!(report.recent_activity.len() <= RECENT_ACTIVITY_CAP);
    }

    #[test]
    fn test_mock_report_has_no_nan() {
        let collector = HealthCollector::new(config(&[("acme", "engine")]));
        let report = collector.collect_mock(3);

        assert!(report.summary.avg_response_time_ms.is_finite());
        assert!(report.pr_summary.avg_review_time_ms.is_finite());
        assert!(report.issue_summary.closure_rate.is_finite());
        assert!(report.maintainer_summary.concentration.is_finite());
        assert!(report.ci_summary.success_rate.is_finite());
    }

    #[test]
    fn test_empty_fleet_report_is_all_zero() {
        let collector = HealthCollector::new(config(&[]));
        let report = collector.collect_mock(1);

        assert_eq!(report.summary.total_contributors, 0);
        assert_eq!(report.summary.pr_merge_rate, 0.0);
        assert!(report.maintainers.is_empty());
        assert!(report.recent_activity.is_empty());
    }
}
