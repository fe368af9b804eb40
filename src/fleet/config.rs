//! Static configuration surface for the metrics engine
//!
//! The engine is configured once at startup: the list of monitored
//! repositories, the per-family lookback windows, the mock-data toggle and
//! an optional GitHub token. Nothing here changes during a load cycle.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable consulted for the GitHub token when no explicit
/// token is passed on the command line.
pub const GITHUB_TOKEN_ENV: &str = "FLEETHEALTH_GITHUB_TOKEN";

/// Identity of a monitored repository
///
/// This is the identity key for all per-repository aggregation. Instances
/// come from static configuration and are never created from API responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Organization or user that owns the repository
    pub org: String,

    /// Repository name without the owner
    pub name: String,
}

impl RepositoryRef {
    pub fn new(org: impl Into<String>, name: impl Into<String>) -> Self {
        RepositoryRef {
            org: org.into(),
            name: name.into(),
        }
    }

    /// The "org/name" form used in API paths and display output
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }

    /// Parses an "org/name" string into a RepositoryRef
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.split_once('/') {
            Some((org, name)) if !org.is_empty() && !name.is_empty() => {
                Ok(RepositoryRef::new(org, name))
            }
            _ => Err(format!(
                "Invalid repository '{}': expected the form 'org/name'",
                s
            )),
        }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

/// Lookback windows, in days, for each metric family
///
/// Records are filtered to `created_at >= now - window` before any metric
/// computation. See [`crate::fleet::sampling::SamplingPolicy`] for how the
/// windows combine with sample caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricPeriods {
    /// Window for counting distinct contributors
    pub contributors: i64,

    /// Sub-window for the "new contributor" subset
    pub new_contributors: i64,

    /// Window for first-response latency and PR detail metrics
    pub response_time: i64,

    /// Window for PR merge-rate computation
    ///
    /// Accepted from config files but currently inert: PR windowing runs on
    /// [`response_time`](MetricPeriods::response_time), so the merge rate is
    /// computed over that window instead. Kept so configs that set it keep
    /// parsing.
    pub pr_merge_rate: i64,

    /// Window for the recent-activity feed
    pub recent_activity: i64,

    /// Window for CI workflow run health
    pub ci_runs: i64,
}

impl Default for MetricPeriods {
    fn default() -> Self {
        MetricPeriods {
            contributors: 90,
            new_contributors: 30,
            response_time: 30,
            pr_merge_rate: 30,
            recent_activity: 14,
            ci_runs: 7,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Repositories to monitor; the "fleet"
    pub repositories: Vec<RepositoryRef>,

    /// Per-family lookback windows in days
    #[serde(default)]
    pub periods: MetricPeriods,

    /// When true, the mock generator substitutes for all live fetching
    #[serde(default)]
    pub use_mock_data: bool,

    /// Optional GitHub token. Filled in by [`DashboardConfig::resolve_token`];
    /// usually absent from the config file itself.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Comment posted before closing a stale item
    #[serde(default = "default_stale_close_message")]
    pub stale_close_message: String,
}

fn default_stale_close_message() -> String {
    "This item has been inactive for an extended period and is being closed \
     as stale. Please reopen or file a new issue if it is still relevant."
        .to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            repositories: Vec::new(),
            periods: MetricPeriods::default(),
            use_mock_data: false,
            github_token: None,
            stale_close_message: default_stale_close_message(),
        }
    }
}

impl DashboardConfig {
    /// Loads configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as a
    /// configuration document.
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        serde_json::from_str(&raw)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))
    }

    /// Resolves the GitHub token from the available sources, in priority order:
    /// explicit override (CLI flag), the `FLEETHEALTH_GITHUB_TOKEN` environment
    /// variable, then a token file under the user's config directory.
    ///
    /// The token store is consulted exactly once, at startup. Absence of a
    /// token is not an error; it just means anonymous (lower) rate limits.
    pub fn resolve_token(&mut self, override_token: Option<String>) {
        if let Some(token) = override_token {
            self.github_token = Some(token);
            return;
        }
        if self.github_token.is_some() {
            return;
        }
        if let Ok(token) = std::env::var(GITHUB_TOKEN_ENV) {
            if !token.is_empty() {
                self.github_token = Some(token);
                return;
            }
        }
        if let Some(path) = token_file_path() {
            if let Ok(token) = std::fs::read_to_string(&path) {
                let token = token.trim();
                if !token.is_empty() {
                    tracing::debug!("Using GitHub token from {}", path.display());
                    self.github_token = Some(token.to_string());
                }
            }
        }
    }
}

/// Location of the persisted token file, if a config directory exists
fn token_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fleethealth").join("token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_ref_parse() {
        let repo = RepositoryRef::parse("konveyor/kantra").unwrap();
        assert_eq!(repo.org, "konveyor");
        assert_eq!(repo.name, "kantra");
        assert_eq!(repo.full_name(), "konveyor/kantra");

        assert!(RepositoryRef::parse("no-slash").is_err());
        assert!(RepositoryRef::parse("/missing-org").is_err());
        assert!(RepositoryRef::parse("missing-name/").is_err());
    }

    #[test]
    fn test_default_periods() {
        let periods = MetricPeriods::default();
        assert_eq!(periods.contributors, 90);
        assert_eq!(periods.new_contributors, 30);
        assert_eq!(periods.response_time, 30);
        assert_eq!(periods.ci_runs, 7);
    }

    #[test]
    fn test_config_parses_with_partial_periods() {
        let json = r#"{
            "repositories": [{"org": "konveyor", "name": "kantra"}],
            "periods": {"contributors": 60}
        }"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.periods.contributors, 60);
        // Unspecified periods keep their defaults
        assert_eq!(config.periods.response_time, 30);
        assert!(!config.use_mock_data);
    }
}
