//! Tests for fleet-wide rollup behavior over hand-built per-repo records

use std::collections::BTreeSet;

use fleethealth::fleet::aggregate::{
    fleet_summary, maintainer_fleet_summary, top_share, BurnoutRisk,
};
use fleethealth::fleet::config::RepositoryRef;
use fleethealth::fleet::metrics::maintainers::MaintainerRecord;
use fleethealth::fleet::metrics::RepoActivityHealth;

fn logins(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn repo_record(name: &str, contributors: &[&str], issue_ms: f64) -> RepoActivityHealth {
    RepoActivityHealth {
        repo: RepositoryRef::new("acme", name),
        contributor_logins: logins(contributors),
        new_contributor_logins: BTreeSet::new(),
        avg_issue_response_ms: issue_ms,
        avg_pr_response_ms: 0.0,
        pr_merge_rate: 80.0,
        open_issues: 4,
        open_prs: 2,
    }
}

fn maintainer(name: &str, responses: u64, share: f64) -> MaintainerRecord {
    MaintainerRecord {
        username: name.to_string(),
        response_count: responses,
        issue_responses: responses,
        pr_responses: 0,
        avg_response_time_ms: 3_600_000.0,
        repo_count: 1,
        response_share: share,
    }
}

#[test]
fn test_contributor_totals_are_set_unions() {
    // alice/bob and bob/carol overlap on bob: 3 distinct, never 4
    let records = vec![
        repo_record("engine", &["alice", "bob"], 1000.0),
        repo_record("tools", &["bob", "carol"], 2000.0),
    ];
    let summary = fleet_summary(&records);

    assert_eq!(summary.total_contributors, 3);
    assert_eq!(summary.open_issues, 8);
    assert_eq!(summary.open_prs, 4);
}

#[test]
fn test_duration_averages_skip_silent_repos() {
    // The second repo's 0.0 means "no responded samples", not instant
    // response; it must not drag the fleet average down
    let records = vec![
        repo_record("engine", &["alice"], 4000.0),
        repo_record("tools", &["bob"], 0.0),
        repo_record("docs", &["carol"], 2000.0),
    ];
    let summary = fleet_summary(&records);

    assert_eq!(summary.avg_issue_response_ms, 3000.0);
}

#[test]
fn test_empty_fleet_is_all_zeroes_never_nan() {
    let summary = fleet_summary(&[]);
    assert_eq!(summary.total_contributors, 0);
    assert_eq!(summary.pr_merge_rate, 0.0);
    assert!(summary.avg_response_time_ms == 0.0);
    assert!(!summary.avg_issue_response_ms.is_nan());
}

#[test]
fn test_concentration_takes_ceil_of_top_fifth() {
    // Three maintainers: ceil(3 * 0.2) = 1, so the top share is exactly
    // the leader's 70%
    let ranked = vec![
        maintainer("erin", 70, 70.0),
        maintainer("frank", 20, 20.0),
        maintainer("gail", 10, 10.0),
    ];

    assert!((top_share(&ranked, 0.2) - 70.0).abs() < 0.01);

    let summary = maintainer_fleet_summary(&ranked);
    assert_eq!(summary.active_maintainers, 3);
    assert_eq!(summary.total_responses, 100);
    assert_eq!(summary.burnout_risk, BurnoutRisk::Medium);

    // Cumulative share reaches exactly 100 at the last rank
    let last = summary.cumulative_share.last().unwrap();
    assert_eq!(last.rank, 3);
    assert!((last.percent - 100.0).abs() < 0.0001);
}

#[test]
fn test_concentration_full_fraction_is_total() {
    let ranked = vec![maintainer("erin", 5, 50.0), maintainer("frank", 5, 50.0)];
    assert!((top_share(&ranked, 1.0) - 100.0).abs() < 0.0001);
    assert_eq!(top_share(&[], 0.2), 0.0);
}
