//! FleetHealth: community health metrics for fleets of GitHub repositories
//!
//! This library collects activity, responsiveness, pull-request, issue,
//! maintainer-load and CI health metrics across a configured set of
//! repositories ("the fleet") and rolls them up into a single report.
//!
//! ## What it measures
//!
//! - Contributor counts (distinct logins, set-unioned across repos)
//! - First-response latency for issues and PRs
//! - PR merge rate, review/merge time, revisions and size distribution
//! - Issue closure rate, time-to-close and open-issue age distribution
//! - Maintainer response load, concentration and burnout risk
//! - CI workflow success rates and durations
//!
//! ## Authentication
//!
//! GitHub access works with or without a token. A token raises the API
//! quota from 60 to 5,000 requests/hour and is resolved at startup from,
//! in priority order: an explicit override, the `FLEETHEALTH_GITHUB_TOKEN`
//! environment variable, then a token file under the user's config
//! directory.
//!
//! ```bash
//! export FLEETHEALTH_GITHUB_TOKEN=your_github_token
//! ```
//!
//! The close action additionally requires a token with write scope; the
//! token is probed once and the action refused when it is read-only.
//!
//! ## Usage
//!
//! ```no_run
//! use fleethealth::fleet::{DashboardConfig, HealthCollector, RepositoryRef};
//!
//! # async fn run() {
//! let config = DashboardConfig {
//!     repositories: vec![RepositoryRef::new("konveyor", "kantra")],
//!     ..Default::default()
//! };
//! let collector = HealthCollector::new(config);
//! let report = collector.collect().await;
//! println!("{} contributors", report.summary.total_contributors);
//! # }
//! ```

pub mod fleet;
pub mod services;
