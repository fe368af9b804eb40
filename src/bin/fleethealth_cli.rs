use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{self, EnvFilter};

use fleethealth::fleet::collector::FleetHealthReport;
use fleethealth::fleet::config::{DashboardConfig, RepositoryRef};
use fleethealth::fleet::history::{TrendPeriod, TrendSeries};
use fleethealth::fleet::HealthCollector;
use fleethealth::services;

#[derive(Parser)]
#[command(author, version = "0.1.0", about = "Community health metrics for fleets of GitHub repositories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// GitHub API token (overrides FLEETHEALTH_GITHUB_TOKEN environment variable)
    #[arg(short = 't', long, global = true)]
    github_token: Option<String>,

    /// Path to the fleet configuration file
    #[arg(short = 'c', long = "config", global = true, default_value = "fleethealth.json")]
    config_path: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a fleet health report and print it
    Collect {
        /// Substitute generated mock data for live API calls
        #[arg(long)]
        mock: bool,

        /// Seed for the mock generator (only used with --mock)
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Print the full report as JSON instead of the summary tables
        #[arg(long)]
        json: bool,
    },
    /// Print a historical trend series from the snapshot directory
    Trends {
        /// Directory holding index.json and the daily snapshot files
        #[arg(long = "data-dir", default_value = "data/history")]
        data_dir: PathBuf,

        /// Trailing period to chart
        #[arg(long, value_enum, default_value = "30")]
        period: TrendPeriodArg,

        /// Which series to print
        #[arg(long, value_enum, default_value = "contributors")]
        series: TrendSeriesArg,
    },
    /// Generate backdated mock snapshots for the trends command
    GenHistory {
        /// Directory to write index.json and the daily snapshot files into
        #[arg(long = "data-dir", default_value = "data/history")]
        data_dir: PathBuf,

        /// Number of days to generate, ending today
        #[arg(long, default_value = "90")]
        days: u32,

        /// Seed for the mock generator
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// List open stale-labeled issues and pull requests across the fleet
    Stale {
        /// Print the listing as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Comment on and close a stale issue or pull request
    Close {
        /// Repository in org/name form
        repository: String,

        /// Issue or PR number to close
        number: u64,

        /// Override the configured close message
        #[arg(long)]
        message: Option<String>,
    },
}

/// Trailing period for the trends command
#[derive(clap::ValueEnum, Clone, Debug)]
enum TrendPeriodArg {
    #[value(name = "30")]
    Last30,
    #[value(name = "60")]
    Last60,
    #[value(name = "90")]
    Last90,
    All,
}

impl From<TrendPeriodArg> for TrendPeriod {
    fn from(value: TrendPeriodArg) -> Self {
        match value {
            TrendPeriodArg::Last30 => TrendPeriod::Last30,
            TrendPeriodArg::Last60 => TrendPeriod::Last60,
            TrendPeriodArg::Last90 => TrendPeriod::Last90,
            TrendPeriodArg::All => TrendPeriod::All,
        }
    }
}

/// Selectable series for the trends command
#[derive(clap::ValueEnum, Clone, Debug)]
enum TrendSeriesArg {
    Contributors,
    Activity,
    ResponseTime,
    MergeRate,
    ReviewTime,
    MergeTime,
    ClosureRate,
    MaintainerCount,
    Concentration,
}

impl From<TrendSeriesArg> for TrendSeries {
    fn from(value: TrendSeriesArg) -> Self {
        match value {
            TrendSeriesArg::Contributors => TrendSeries::Contributors,
            TrendSeriesArg::Activity => TrendSeries::Activity,
            TrendSeriesArg::ResponseTime => TrendSeries::ResponseTime,
            TrendSeriesArg::MergeRate => TrendSeries::MergeRate,
            TrendSeriesArg::ReviewTime => TrendSeries::ReviewTime,
            TrendSeriesArg::MergeTime => TrendSeries::MergeTime,
            TrendSeriesArg::ClosureRate => TrendSeries::ClosureRate,
            TrendSeriesArg::MaintainerCount => TrendSeries::MaintainerCount,
            TrendSeriesArg::Concentration => TrendSeries::Concentration,
        }
    }
}

/// Loads the fleet configuration, falling back to a built-in demo fleet
/// when the file is absent and mock data will be used anyway
fn load_config(
    config_path: &std::path::Path,
    override_token: Option<String>,
    allow_demo_fallback: bool,
) -> Result<DashboardConfig> {
    let mut config = match DashboardConfig::load(config_path) {
        Ok(config) => config,
        Err(e) if allow_demo_fallback => {
            tracing::warn!("{}; using the built-in demo fleet", e);
            DashboardConfig {
                repositories: vec![
                    RepositoryRef::new("konveyor", "kantra"),
                    RepositoryRef::new("konveyor", "tackle2-hub"),
                    RepositoryRef::new("konveyor", "move2kube"),
                ],
                ..Default::default()
            }
        }
        Err(e) => return Err(anyhow::anyhow!(e)),
    };
    config.resolve_token(override_token);
    Ok(config)
}

/// Renders a millisecond duration, with `0` meaning "no data"
fn format_duration_ms(ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    let hours = ms / 3_600_000.0;
    if hours >= 48.0 {
        format!("{:.1}d", hours / 24.0)
    } else if hours >= 1.0 {
        format!("{:.1}h", hours)
    } else {
        format!("{:.0}m", ms / 60_000.0)
    }
}

fn print_report(report: &FleetHealthReport) {
    let s = &report.summary;
    println!("Fleet overview ({} repositories{})", s.repositories, if report.mock { ", mock data" } else { "" });
    println!("  Contributors:        {} ({} new)", s.total_contributors, s.new_contributors);
    println!("  Avg response time:   {}", format_duration_ms(s.avg_response_time_ms));
    println!("  PR merge rate:       {:.1}%", s.pr_merge_rate);
    println!("  Open issues / PRs:   {} / {}", s.open_issues, s.open_prs);
    println!();

    println!("{:<40} {:>12} {:>6} {:>12} {:>12}", "Repository", "Contributors", "New", "Merge rate", "Response");
    for repo in &report.repos {
        println!(
            "{:<40} {:>12} {:>6} {:>11.1}% {:>12}",
            repo.repo.full_name(),
            repo.contributors(),
            repo.new_contributors(),
            repo.pr_merge_rate,
            format_duration_ms(repo.avg_issue_response_ms),
        );
    }
    println!();

    let pr = &report.pr_summary;
    println!("Pull requests: {} in window, {} open", pr.total_prs, pr.open_prs);
    println!("  Merge rate:   {:.1}%", pr.merge_rate);
    println!("  Review time:  {}", format_duration_ms(pr.avg_review_time_ms));
    println!("  Merge time:   {}", format_duration_ms(pr.avg_merge_time_ms));
    println!(
        "  Sizes:        xs {} / s {} / m {} / l {} / xl {}",
        pr.size_distribution.xs,
        pr.size_distribution.s,
        pr.size_distribution.m,
        pr.size_distribution.l,
        pr.size_distribution.xl
    );
    println!();

    let issues = &report.issue_summary;
    println!("Issues: {} open", issues.open_issues);
    println!("  Closure rate:      {:.1}%", issues.closure_rate);
    println!("  Time to close:     {}", format_duration_ms(issues.avg_time_to_close_ms));
    println!("  First response:    {}", format_duration_ms(issues.avg_time_to_first_response_ms));
    println!("  Response coverage: {:.1}%", issues.response_coverage);
    println!();

    let maintainers = &report.maintainer_summary;
    println!(
        "Maintainers: {} active, {} responses, top-20% share {:.1}% ({} burnout risk)",
        maintainers.active_maintainers,
        maintainers.total_responses,
        maintainers.concentration,
        maintainers.burnout_risk
    );
    for record in report.maintainers.iter().take(10) {
        println!(
            "  {:<20} {:>5} responses ({:>4.1}%) avg {}",
            record.username,
            record.response_count,
            record.response_share,
            format_duration_ms(record.avg_response_time_ms),
        );
    }
    println!();

    let ci = &report.ci_summary;
    println!(
        "CI: {} workflows, {} runs, {:.1}% success, avg {}",
        ci.workflows,
        ci.total_runs,
        ci.success_rate,
        format_duration_ms(ci.avg_duration_ms)
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        github_token,
        config_path,
        debug,
        command,
    } = Cli::parse();

    // Initialize logging
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr) // Use stderr for logging
        .with_target(false)
        .init();

    match command {
        Commands::Collect { mock, seed, json } => {
            let config = load_config(&config_path, github_token, mock)?;
            let collector = HealthCollector::new(config);
            let report = services::collect_fleet_health(&collector, mock, seed).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Trends {
            data_dir,
            period,
            series,
        } => {
            let today = Utc::now().date_naive();
            let slice = services::load_trend_slice(&data_dir, period.into(), today)
                .map_err(|e| anyhow::anyhow!(e))?;
            let series: TrendSeries = series.into();
            println!("{} ({} snapshots)", series, slice.len());
            for (date, value) in services::trend_series(&slice, series) {
                println!("  {}  {:.1}", date, value);
            }
        }
        Commands::GenHistory {
            data_dir,
            days,
            seed,
        } => {
            let config = load_config(&config_path, github_token, true)?;
            let today = Utc::now().date_naive();
            let written =
                services::generate_history(&data_dir, days, seed, today, &config.repositories)
                    .map_err(|e| anyhow::anyhow!(e))?;
            println!("Wrote {} snapshots to {}", written, data_dir.display());
        }
        Commands::Stale { json } => {
            let config = load_config(&config_path, github_token, false)?;
            let client = fleethealth::fleet::github::GithubClient::new(
                reqwest::Client::new(),
                config.github_token.clone(),
            );
            let items = services::list_stale(&client, &config.repositories).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                let issues = items
                    .iter()
                    .filter(|i| i.record.kind == fleethealth::fleet::github::models::ItemKind::Issue)
                    .count();
                println!(
                    "{} stale items ({} issues, {} PRs)",
                    items.len(),
                    issues,
                    items.len() - issues
                );
                for item in &items {
                    println!(
                        "  {:<5} {:<30} #{:<6} {:<50} updated {}",
                        item.record.kind,
                        item.repository,
                        item.record.number,
                        item.record.title,
                        item.record.updated_at.format("%Y-%m-%d"),
                    );
                }
            }
        }
        Commands::Close {
            repository,
            number,
            message,
        } => {
            let config = load_config(&config_path, github_token, false)?;
            let repo = RepositoryRef::parse(&repository).map_err(|e| anyhow::anyhow!(e))?;
            let message = message.unwrap_or_else(|| config.stale_close_message.clone());

            let client = fleethealth::fleet::github::GithubClient::new(
                reqwest::Client::new(),
                config.github_token.clone(),
            );
            services::close_stale(&client, &repo, number, &message)
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            println!("Closed {}#{}", repo.full_name(), number);
        }
    }

    Ok(())
}
