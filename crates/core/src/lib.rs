pub mod config;
pub mod config_loader;
pub mod filter;
pub mod reporting_date;

pub use config::{
    AppConfig, CacheConfig, DashboardConfig, DatabaseConfig, ServerConfig, DB_HOST_ENV,
};
pub use config_loader::ConfigLoader;
pub use filter::{FilterError, FilterState, IssuerType, SegmentFilter, VenueSelection, ViewMode};
pub use reporting_date::{ReportingDatePolicy, TimeWindow};
