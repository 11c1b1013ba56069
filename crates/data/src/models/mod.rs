//! Row models for the dashboard queries.
//!
//! All prices and sizes use `rust_decimal::Decimal`. Models derive
//! `sqlx::FromRow` and map one-to-one onto query result columns.

pub mod activity;
pub mod bond;
pub mod quote;
pub mod trade;

pub use activity::{ActivitySummary, IsinCount, VenueActivity, VenueVolume};
pub use bond::{BondRecord, ASSET_BACKED_SECURITY};
pub use quote::{IssueQuote, QUOTE_VENUE};
pub use trade::{display_quantity, IssueTrade, VolumePoint, TRADE_SIDE};
