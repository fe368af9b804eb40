//! Core fleet-health engine
//!
//! Everything from raw GitHub API payloads to the finished
//! [`collector::FleetHealthReport`] lives under this module:
//!
//! - [`config`] — repository list, metric windows, token resolution
//! - [`github`] — the REST client and its raw payload models
//! - [`sampling`] — window/cap policies bounding per-load API usage
//! - [`metrics`] — pure per-repository extractors
//! - [`aggregate`] — fleet-wide rollups over the per-repo records
//! - [`collector`] — orchestration: fan-out, throttling, report assembly
//! - [`history`] — daily snapshot loading and trend series
//! - [`mock`] — seeded mock data and snapshot history generation
//! - [`actions`] — the stale-close write path

pub mod actions;
pub mod aggregate;
pub mod collector;
pub mod config;
pub mod github;
pub mod history;
pub mod metrics;
pub mod mock;
pub mod sampling;

pub use collector::{FleetHealthReport, HealthCollector};
pub use config::{DashboardConfig, RepositoryRef};
