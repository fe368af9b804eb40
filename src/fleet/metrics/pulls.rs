//! PR size, review latency and merge-rate extraction
//!
//! The merge rate covers every PR created inside the window; size, review
//! time and revision counts come from the sampled detail prefix only, since
//! each of those needs an extra detail call per PR.

use serde::Serialize;

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::{RawPull, RawReview};
use crate::fleet::metrics::{mean_ms, percentage, SizeDistribution};

/// Detail payload for one sampled PR: the detail fetch plus its reviews
#[derive(Debug, Clone)]
pub struct PrDetailSample {
    /// Detail payload (carries additions/deletions/commits)
    pub pull: RawPull,
    pub reviews: Vec<RawReview>,
}

/// PR health record for one repository
#[derive(Debug, Clone, Serialize)]
pub struct PrHealth {
    pub repo: RepositoryRef,

    /// Mean time from PR creation to first submitted review, ms.
    /// `0.0` when no sampled PR received a review.
    pub avg_review_time_ms: f64,

    /// Mean time from creation to merge over sampled merged PRs, ms
    pub avg_merge_time_ms: f64,

    /// Mean commit count over the sampled PRs
    pub avg_revisions: f64,

    /// `merged / total-in-window * 100`; 0 when no PRs were created in window
    pub merge_rate: f64,

    /// PRs created within the window
    pub total_prs: usize,

    /// Currently open PRs (all, not window-filtered)
    pub open_prs: usize,

    pub size_distribution: SizeDistribution,
}

/// Extracts PR health from windowed PRs and the sampled detail prefix
pub fn pr_health(
    repo: &RepositoryRef,
    windowed: &[RawPull],
    open_prs: usize,
    samples: &[PrDetailSample],
) -> PrHealth {
    let merged_in_window = windowed.iter().filter(|pr| pr.merged_at.is_some()).count();

    let mut size_distribution = SizeDistribution::default();
    let mut review_times = Vec::new();
    let mut merge_times = Vec::new();
    let mut revisions = Vec::new();

    for sample in samples {
        size_distribution.add(sample.pull.changed_lines());
        revisions.push(sample.pull.commits.unwrap_or(1) as f64);

        // Time to first review, from the earliest submitted review
        if let Some(first_review) = sample
            .reviews
            .iter()
            .filter_map(|r| r.submitted_at)
            .min()
        {
            review_times.push((first_review - sample.pull.created_at).num_milliseconds() as f64);
        }

        if let Some(merged_at) = sample.pull.merged_at {
            merge_times.push((merged_at - sample.pull.created_at).num_milliseconds() as f64);
        }
    }

    PrHealth {
        repo: repo.clone(),
        avg_review_time_ms: mean_ms(&review_times),
        avg_merge_time_ms: mean_ms(&merge_times),
        avg_revisions: if revisions.is_empty() {
            0.0
        } else {
            revisions.iter().sum::<f64>() / revisions.len() as f64
        },
        merge_rate: percentage(merged_in_window, windowed.len()),
        total_prs: windowed.len(),
        open_prs,
        size_distribution,
    }
}
