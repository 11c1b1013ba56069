//! The read-only data source behind every dashboard view.

use async_trait::async_trait;
use compass_core::{IssuerType, SegmentFilter, TimeWindow};

use crate::error::DataAccessError;
use crate::models::{
    ActivitySummary, BondRecord, IsinCount, IssueQuote, IssueTrade, VenueActivity, VenueVolume,
    VolumePoint,
};

pub type DataResult<T> = Result<T, DataAccessError>;

/// Queries needed by the dashboard. Implementations must treat an empty venue
/// list as "match nothing".
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Distinct venues with percent-priced trades, sorted, no duplicates.
    async fn eligible_venues(&self, window: TimeWindow) -> DataResult<Vec<String>>;

    /// Countries of bonds that have traded, sorted.
    async fn countries(&self) -> DataResult<Vec<String>>;

    async fn most_traded(
        &self,
        window: TimeWindow,
        issuer_type: Option<IssuerType>,
    ) -> DataResult<Vec<IsinCount>>;

    async fn most_quoted(&self, window: TimeWindow) -> DataResult<Vec<IsinCount>>;

    async fn segment_trades(&self, filter: &SegmentFilter) -> DataResult<Vec<VolumePoint>>;

    async fn segment_trades_per_venue(
        &self,
        filter: &SegmentFilter,
    ) -> DataResult<Vec<VenueVolume>>;

    async fn issue_trades(
        &self,
        isin: &str,
        window: TimeWindow,
        venues: &[String],
    ) -> DataResult<Vec<IssueTrade>>;

    async fn issue_quotes(&self, isin: &str, window: TimeWindow) -> DataResult<Vec<IssueQuote>>;

    async fn bond(&self, isin: &str) -> DataResult<Option<BondRecord>>;

    async fn activity_summary(&self, window: TimeWindow) -> DataResult<ActivitySummary>;

    async fn venue_activity(
        &self,
        window: TimeWindow,
        issuer_type: IssuerType,
    ) -> DataResult<Vec<VenueActivity>>;
}

/// Sorts ascending and drops duplicates and blanks.
#[must_use]
pub fn normalize_venues(mut venues: Vec<String>) -> Vec<String> {
    venues.retain(|v| !v.trim().is_empty());
    venues.sort();
    venues.dedup();
    venues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_venues_sorts_and_dedups() {
        let venues = vec![
            "TREU".to_string(),
            "BMTF".to_string(),
            String::new(),
            "TREU".to_string(),
            "MTSC".to_string(),
        ];
        assert_eq!(normalize_venues(venues), vec!["BMTF", "MTSC", "TREU"]);
    }
}
