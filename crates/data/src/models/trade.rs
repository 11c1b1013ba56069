//! Trade execution rows.
//!
//! Trades are ingested elsewhere and are read-only here. Bond venues report
//! size either as a quantity or as a notional amount, so the size shown to
//! users is the larger of the two.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side label given to trades when they are plotted next to quotes.
pub const TRADE_SIDE: &str = "trade";

/// A single execution of one instrument, as shown on the per-issue view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueTrade {
    pub timestamp: DateTime<Utc>,
    /// Price as a percentage of face value.
    pub price: Decimal,
    pub quantity: Option<Decimal>,
    pub notional_amount: Option<Decimal>,
    pub venue: String,
    pub source: Option<String>,
}

impl IssueTrade {
    /// Size shown to users: `max(quantity, notional_amount)`, ignoring
    /// missing values the same way SQL `GREATEST` does.
    #[must_use]
    pub fn display_quantity(&self) -> Option<Decimal> {
        display_quantity(self.quantity, self.notional_amount)
    }
}

/// `GREATEST(quantity, notional_amount)` with SQL null semantics.
#[must_use]
pub fn display_quantity(quantity: Option<Decimal>, notional: Option<Decimal>) -> Option<Decimal> {
    match (quantity, notional) {
        (Some(q), Some(n)) => Some(q.max(n)),
        (q, n) => q.or(n),
    }
}

/// Timestamped trade size used for activity-over-time histograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VolumePoint {
    pub trade_datetime: DateTime<Utc>,
    /// Already reduced to the display quantity by the query.
    pub quantity: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade(quantity: Option<Decimal>, notional: Option<Decimal>) -> IssueTrade {
        IssueTrade {
            timestamp: Utc.with_ymd_and_hms(2023, 6, 2, 10, 15, 0).unwrap(),
            price: dec!(99.125),
            quantity,
            notional_amount: notional,
            venue: "BMTF".to_string(),
            source: Some("apa".to_string()),
        }
    }

    #[test]
    fn display_quantity_takes_the_larger_value() {
        assert_eq!(
            trade(Some(dec!(200000)), Some(dec!(198500))).display_quantity(),
            Some(dec!(200000))
        );
        assert_eq!(
            trade(Some(dec!(0)), Some(dec!(500000))).display_quantity(),
            Some(dec!(500000))
        );
    }

    #[test]
    fn display_quantity_ignores_missing_side() {
        assert_eq!(trade(None, Some(dec!(10))).display_quantity(), Some(dec!(10)));
        assert_eq!(trade(Some(dec!(7)), None).display_quantity(), Some(dec!(7)));
        assert_eq!(trade(None, None).display_quantity(), None);
    }
}
