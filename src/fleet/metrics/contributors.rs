//! Contributor activity extraction
//!
//! Collects distinct commit-author logins within the contributor window and
//! the subset whose commits fall inside the shorter new-contributor
//! sub-window. The underlying login sets are kept on the record because the
//! fleet rollup deduplicates by set union, never by summing per-repo counts.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::models::RawCommit;
use crate::fleet::sampling::SamplingPolicy;

/// Distinct contributors for one repository
#[derive(Debug, Clone, Serialize)]
pub struct ContributorActivity {
    pub repo: RepositoryRef,

    /// Logins of everyone who authored a commit within the window
    pub logins: BTreeSet<String>,

    /// Subset of `logins` with a commit inside the new-contributor sub-window
    pub new_logins: BTreeSet<String>,
}

impl ContributorActivity {
    pub fn count(&self) -> usize {
        self.logins.len()
    }

    pub fn new_count(&self) -> usize {
        self.new_logins.len()
    }
}

/// Extracts contributor activity from commits already filtered to the
/// contributor window
///
/// Commits without a mapped GitHub account (`author == None`) are skipped;
/// git email addresses are not usable as stable identifiers.
pub fn contributor_activity(
    repo: &RepositoryRef,
    commits: &[RawCommit],
    new_contributor_policy: &SamplingPolicy,
    now: DateTime<Utc>,
) -> ContributorActivity {
    let new_window_start = new_contributor_policy.window_start(now);

    let mut logins = BTreeSet::new();
    let mut new_logins = BTreeSet::new();

    for commit in commits {
        let Some(author) = &commit.author else {
            continue;
        };
        logins.insert(author.login.clone());
        if commit.commit.author.date >= new_window_start {
            new_logins.insert(author.login.clone());
        }
    }

    ContributorActivity {
        repo: repo.clone(),
        logins,
        new_logins,
    }
}
