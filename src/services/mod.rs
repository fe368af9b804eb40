//! Service functions bridging the CLI to the engine
//!
//! Each function takes its dependencies explicitly and touches no global
//! state, so the CLI stays a thin argument-parsing shell and the functions
//! stay directly unit-testable.

use std::path::Path;

use chrono::NaiveDate;

use crate::fleet::actions::{close_stale_item, CloseStaleError};
use crate::fleet::collector::{FleetHealthReport, HealthCollector};
use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::IssueRecord;
use crate::fleet::github::{GithubClient, TokenAccess};
use crate::fleet::history::{
    filter_by_period, series_points, HistoricalSnapshot, TrendLoader, TrendPeriod, TrendSeries,
};
use crate::fleet::mock::MockGenerator;

/// Runs one full collection and returns the finished report
///
/// When `force_mock` is set the configured mock switch is ignored and the
/// mock generator runs with the given seed; otherwise the collector follows
/// its configuration.
pub async fn collect_fleet_health(
    collector: &HealthCollector,
    force_mock: bool,
    mock_seed: u64,
) -> FleetHealthReport {
    if force_mock {
        collector.collect_mock(mock_seed)
    } else {
        collector.collect().await
    }
}

/// Loads the snapshot directory and filters it to the requested period
///
/// # Errors
///
/// Returns an error when the directory holds no loadable snapshots, since a
/// trend over zero points is meaningless to render.
pub fn load_trend_slice(
    snapshot_dir: &Path,
    period: TrendPeriod,
    today: NaiveDate,
) -> Result<Vec<HistoricalSnapshot>, String> {
    let mut loader = TrendLoader::new(snapshot_dir);
    let snapshots = loader.load();
    if snapshots.is_empty() {
        return Err(format!(
            "No historical snapshots found under {}; run gen-history first",
            snapshot_dir.display()
        ));
    }
    Ok(filter_by_period(snapshots, period, today))
}

/// Extracts one dated numeric series from a snapshot slice
pub fn trend_series(
    snapshots: &[HistoricalSnapshot],
    series: TrendSeries,
) -> Vec<(NaiveDate, f64)> {
    series_points(snapshots, series)
}

/// Generates a backdated snapshot directory for trend charts
///
/// # Errors
///
/// Returns an error when a snapshot or the index cannot be written.
pub fn generate_history(
    dir: &Path,
    days: u32,
    seed: u64,
    today: NaiveDate,
    repositories: &[RepositoryRef],
) -> Result<usize, String> {
    let index = MockGenerator::new(seed).write_history(dir, days, today, repositories)?;
    Ok(index.available_dates.len())
}

/// One stale item annotated with the repository it came from
#[derive(Debug, Clone, serde::Serialize)]
pub struct StaleItem {
    pub repository: String,
    #[serde(flatten)]
    pub record: IssueRecord,
}

/// Inventories every open `stale`-labeled item across the fleet
///
/// Walks all pages per repository; a repository whose listing fails
/// contributes whatever pages were fetched before the failure. Results are
/// sorted most recently updated first.
pub async fn list_stale(client: &GithubClient, repositories: &[RepositoryRef]) -> Vec<StaleItem> {
    let mut items = Vec::new();
    for repo in repositories {
        for record in client.list_stale_items(repo).await {
            items.push(StaleItem {
                repository: repo.full_name(),
                record,
            });
        }
    }
    items.sort_by(|a, b| b.record.updated_at.cmp(&a.record.updated_at));
    items
}

/// Closes a stale issue or PR after verifying token write access
///
/// # Errors
///
/// Returns an error when the token lacks write access, or when posting the
/// comment or the close call fails. The error distinguishes whether the
/// comment already landed.
pub async fn close_stale(
    client: &GithubClient,
    repo: &RepositoryRef,
    number: u64,
    message: &str,
) -> Result<(), CloseStaleError> {
    let TokenAccess { has_write_access } = client.probe_token_access().await;
    if !has_write_access {
        return Err(CloseStaleError {
            comment_posted: false,
            message: "The configured token lacks write access; cannot close items".to_string(),
        });
    }
    close_stale_item(client, repo, number, message).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_load_trend_slice_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_str("2026-08-30").unwrap();
        let err = load_trend_slice(dir.path(), TrendPeriod::All, today).unwrap_err();
        assert!(err.contains("gen-history"));
    }

    #[test]
    fn test_generate_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_str("2026-08-30").unwrap();
        let repos = vec![RepositoryRef::new("acme", "engine")];

        let written = generate_history(dir.path(), 10, 1, today, &repos).unwrap();
        assert_eq!(written, 10);

        let slice = load_trend_slice(dir.path(), TrendPeriod::All, today).unwrap();
        assert_eq!(slice.len(), 10);

        let points = trend_series(&slice, TrendSeries::Contributors);
        assert_eq!(points.len(), 10);
        assert!(points.iter().all(|(_, v)| v.is_finite()));
    }
}
