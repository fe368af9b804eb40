//! CI workflow run health extraction
//!
//! Success rate is computed over all runs in the lookback window; average
//! duration only over runs that have both a start and a completion
//! timestamp (in-progress runs have no `updated_at` endpoint to measure).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::{RawWorkflow, RawWorkflowRun};
use crate::fleet::metrics::{mean_ms, percentage};

/// A trimmed run row for the recent-runs table
#[derive(Debug, Clone, Serialize)]
pub struct CiRun {
    pub id: u64,
    pub branch: String,
    pub conclusion: String,
    pub created_at: DateTime<Utc>,
    /// `0.0` when the run has not completed
    pub duration_ms: f64,
    pub triggered_by: String,
}

/// Health record for one workflow in one repository
#[derive(Debug, Clone, Serialize)]
pub struct CiWorkflowHealth {
    pub repo: RepositoryRef,
    pub workflow_id: u64,
    pub name: String,
    pub branch: String,

    /// Conclusion (or status, while running) of the most recent run
    pub status: String,
    pub last_run_at: DateTime<Utc>,

    /// Mean duration over completed runs, ms; `0.0` with no completed runs
    pub avg_duration_ms: f64,

    /// `successful / total * 100` over the window; 0 with no runs
    pub success_rate: f64,

    pub total_runs: usize,

    /// Up to ten most recent runs, newest first
    pub recent_runs: Vec<CiRun>,
}

/// Extracts workflow health from one workflow's windowed runs
///
/// Returns `None` when the workflow had no runs in the window, matching the
/// "absent row" treatment rather than an all-zero record.
pub fn workflow_health(
    repo: &RepositoryRef,
    workflow: &RawWorkflow,
    runs: &[RawWorkflowRun],
) -> Option<CiWorkflowHealth> {
    let last_run = runs.first()?;

    let successful = runs
        .iter()
        .filter(|r| r.conclusion.as_deref() == Some("success"))
        .count();

    let durations: Vec<f64> = runs.iter().filter_map(|r| r.duration_ms()).collect();

    let recent_runs = runs
        .iter()
        .take(10)
        .map(|r| CiRun {
            id: r.id,
            branch: r.head_branch.clone().unwrap_or_else(|| "main".to_string()),
            conclusion: r
                .conclusion
                .clone()
                .unwrap_or_else(|| "in_progress".to_string()),
            created_at: r.created_at,
            duration_ms: r.duration_ms().unwrap_or(0.0),
            triggered_by: r
                .triggering_actor
                .as_ref()
                .map(|a| a.login.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        })
        .collect();

    Some(CiWorkflowHealth {
        repo: repo.clone(),
        workflow_id: workflow.id,
        name: workflow.name.clone(),
        branch: last_run
            .head_branch
            .clone()
            .unwrap_or_else(|| "main".to_string()),
        status: last_run
            .conclusion
            .clone()
            .unwrap_or_else(|| last_run.status.clone()),
        last_run_at: last_run.created_at,
        avg_duration_ms: mean_ms(&durations),
        success_rate: percentage(successful, runs.len()),
        total_runs: runs.len(),
        recent_runs,
    })
}

/// Whether a workflow belongs to the nightly subset tracked separately
pub fn is_nightly(health: &CiWorkflowHealth) -> bool {
    health.name.to_lowercase().contains("nightly")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn run(id: u64, conclusion: Option<&str>, minutes: Option<i64>) -> RawWorkflowRun {
        let created = Utc::now() - Duration::hours(id as i64);
        RawWorkflowRun {
            id,
            status: if conclusion.is_some() {
                "completed".to_string()
            } else {
                "in_progress".to_string()
            },
            conclusion: conclusion.map(String::from),
            created_at: created,
            updated_at: minutes.map(|m| created + Duration::minutes(m)),
            head_branch: Some("main".to_string()),
            triggering_actor: None,
        }
    }

    fn workflow() -> RawWorkflow {
        RawWorkflow {
            id: 99,
            name: "e2e nightly tests".to_string(),
            state: "active".to_string(),
        }
    }

    #[test]
    fn test_success_rate_and_duration() {
        let repo = RepositoryRef::new("konveyor", "ci");
        let runs = vec![
            run(1, Some("success"), Some(10)),
            run(2, Some("failure"), Some(20)),
            run(3, None, None),
            run(4, Some("success"), Some(30)),
        ];
        let health = workflow_health(&repo, &workflow(), &runs).unwrap();
        assert_eq!(health.success_rate, 50.0);
        assert_eq!(health.total_runs, 4);
        // Duration averaged over the three completed runs only
        assert_eq!(health.avg_duration_ms, 20.0 * 60.0 * 1000.0);
        assert!(is_nightly(&health));
    }

    #[test]
    fn test_no_runs_is_absent_not_zero_row() {
        let repo = RepositoryRef::new("konveyor", "ci");
        assert!(workflow_health(&repo, &workflow(), &[]).is_none());
    }

    #[test]
    fn test_in_progress_last_run_uses_status() {
        let repo = RepositoryRef::new("konveyor", "ci");
        let runs = vec![run(1, None, None), run(2, Some("success"), Some(5))];
        let health = workflow_health(&repo, &workflow(), &runs).unwrap();
        assert_eq!(health.status, "in_progress");
        assert_eq!(health.recent_runs.len(), 2);
        assert_eq!(health.recent_runs[0].duration_ms, 0.0);
    }
}
