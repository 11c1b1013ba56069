//! Read-only data access for the Compass bond dashboard.
//!
//! This crate provides:
//! - Database client owning the `PostgreSQL` pool
//! - Row models for trades, quotes, bonds and aggregates
//! - Parameterized query templates
//! - The `DashboardSource` trait and its `PostgreSQL` repository
//! - A time-to-live result cache decorating any source
//! - The static venue reference loaded from CSV

pub mod cache;
pub mod database;
pub mod error;
pub mod models;
pub mod queries;
pub mod repositories;
pub mod source;
pub mod venue_reference;

// Re-export commonly used types
pub use cache::{CachedDashboardSource, TtlCache};
pub use database::DatabaseClient;
pub use error::DataAccessError;
pub use queries::{BoundQuery, QueryParam};
pub use repositories::PgDashboardSource;
pub use source::{normalize_venues, DashboardSource, DataResult};
pub use venue_reference::{VenueCoverageRow, VenueReference};

// Re-export models
pub use models::{
    display_quantity, ActivitySummary, BondRecord, IsinCount, IssueQuote, IssueTrade,
    VenueActivity, VenueVolume, VolumePoint, ASSET_BACKED_SECURITY, QUOTE_VENUE, TRADE_SIDE,
};
