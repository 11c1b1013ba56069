//! Pre-trade quote rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Venue that all stored quotes come from.
pub const QUOTE_VENUE: &str = "DFRA";

/// A bid or offer for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueQuote {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub quantity: Option<Decimal>,
    /// `bid` or `offer` as stored by the ingestion process.
    pub side: String,
    pub source: Option<String>,
}
