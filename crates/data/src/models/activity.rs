//! Aggregated activity rows returned by counting queries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An instrument and how often it traded or was quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IsinCount {
    pub isin: String,
    pub how_many: i64,
}

/// Trade count and summed display quantity for one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VenueVolume {
    pub venue: String,
    pub how_many: i64,
    pub total_quantity: Option<Decimal>,
}

/// Headline numbers over a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivitySummary {
    pub isin_count: i64,
    pub trade_count: i64,
    pub venue_count: i64,
}

/// Per-venue coverage over a time window, before venue names are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VenueActivity {
    pub venue: String,
    pub isin_count: i64,
    pub trade_count: i64,
}
