//! Database repositories for the dashboard.
//!
//! Repositories provide typed, read-only access to the ingested tables.

pub mod dashboard_repo;

pub use dashboard_repo::PgDashboardSource;
