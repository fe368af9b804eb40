//! Tests for historical snapshot loading and the trend service
//!
//! The loading contract: the index lists candidate dates, each date loads
//! independently, a bad file is skipped rather than failing the series,
//! and the result is sorted ascending by date.

use std::str::FromStr;

use chrono::NaiveDate;
use fleethealth::fleet::config::RepositoryRef;
use fleethealth::fleet::history::{TrendLoader, TrendPeriod, TrendSeries};
use fleethealth::services;

fn write_snapshot(dir: &std::path::Path, date: &str, contributors: f64) {
    let body = serde_json::json!({
        "date": date,
        "metrics": {"totalContributors": contributors, "openIssues": 10.0, "openPRs": 5.0}
    });
    std::fs::write(dir.join(format!("{}.json", date)), body.to_string()).unwrap();
}

fn write_index(dir: &std::path::Path, dates: &[&str]) {
    let body = serde_json::json!({ "available_dates": dates });
    std::fs::write(dir.join("index.json"), body.to_string()).unwrap();
}

#[test]
fn test_bad_snapshot_is_skipped_and_order_restored() {
    let dir = tempfile::tempdir().unwrap();

    // Index deliberately out of order; one listed date has a corrupt file,
    // one has no file at all
    write_index(
        dir.path(),
        &[
            "2026-08-03",
            "2026-08-01",
            "2026-08-02",
            "2026-08-04",
            "2026-08-05",
        ],
    );
    write_snapshot(dir.path(), "2026-08-01", 100.0);
    write_snapshot(dir.path(), "2026-08-02", 110.0);
    write_snapshot(dir.path(), "2026-08-03", 120.0);
    std::fs::write(dir.path().join("2026-08-04.json"), "{ corrupt").unwrap();

    let mut loader = TrendLoader::new(dir.path());
    let snapshots = loader.load();

    assert_eq!(snapshots.len(), 3);
    let dates: Vec<String> = snapshots.iter().map(|s| s.date.to_string()).collect();
    assert_eq!(dates, ["2026-08-01", "2026-08-02", "2026-08-03"]);
}

#[test]
fn test_missing_index_yields_empty_series() {
    let dir = tempfile::tempdir().unwrap();
    let mut loader = TrendLoader::new(dir.path());
    assert!(loader.load().is_empty());
}

#[test]
fn test_trend_service_filters_and_extracts() {
    let dir = tempfile::tempdir().unwrap();
    write_index(dir.path(), &["2026-05-01", "2026-08-20", "2026-08-25"]);
    write_snapshot(dir.path(), "2026-05-01", 80.0);
    write_snapshot(dir.path(), "2026-08-20", 120.0);
    write_snapshot(dir.path(), "2026-08-25", 130.0);

    let today = NaiveDate::from_str("2026-08-30").unwrap();
    let slice = services::load_trend_slice(dir.path(), TrendPeriod::Last30, today).unwrap();
    assert_eq!(slice.len(), 2);

    let contributors = services::trend_series(&slice, TrendSeries::Contributors);
    assert_eq!(contributors[0].1, 120.0);
    assert_eq!(contributors[1].1, 130.0);

    // Activity is open issues + open PRs; missing groups would default to 0
    let activity = services::trend_series(&slice, TrendSeries::Activity);
    assert_eq!(activity[0].1, 15.0);
}

#[test]
fn test_generated_history_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let today = NaiveDate::from_str("2026-08-30").unwrap();
    let repos = vec![
        RepositoryRef::new("acme", "engine"),
        RepositoryRef::new("acme", "tools"),
    ];

    let written = services::generate_history(dir.path(), 30, 7, today, &repos).unwrap();
    assert_eq!(written, 30);

    let slice = services::load_trend_slice(dir.path(), TrendPeriod::All, today).unwrap();
    assert_eq!(slice.len(), 30);
    assert!(slice.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(slice.last().unwrap().date, today);
    assert_eq!(slice.last().unwrap().repositories.len(), 2);

    // Every selectable series must be finite over generated data
    for series in [
        TrendSeries::Contributors,
        TrendSeries::Activity,
        TrendSeries::ResponseTime,
        TrendSeries::MergeRate,
        TrendSeries::ReviewTime,
        TrendSeries::MergeTime,
        TrendSeries::ClosureRate,
        TrendSeries::MaintainerCount,
        TrendSeries::Concentration,
    ] {
        let points = services::trend_series(&slice, series);
        assert_eq!(points.len(), 30);
        assert!(points.iter().all(|(_, v)| v.is_finite() && *v >= 0.0));
    }
}
