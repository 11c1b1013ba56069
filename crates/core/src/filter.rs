//! Filter state chosen by the user.
//!
//! A `FilterState` is rebuilt from the request on every interaction and is
//! never persisted.

use crate::reporting_date::TimeWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rejected filter input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    PerIssue,
    AssetClass,
    VenueCoverage,
}

impl ViewMode {
    pub const ALL: [Self; 3] = [Self::PerIssue, Self::AssetClass, Self::VenueCoverage];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerIssue => "per-issue",
            Self::AssetClass => "asset-class",
            Self::VenueCoverage => "venue-coverage",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PerIssue => "Per-issue view",
            Self::AssetClass => "Asset class view",
            Self::VenueCoverage => "Venue coverage view",
        }
    }
}

impl FromStr for ViewMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| FilterError::InvalidValue {
                field: "view",
                value: s.to_string(),
            })
    }
}

/// Government or corporate issuer, stored lowercase in `bonds.issuer_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerType {
    Government,
    Corporate,
}

impl IssuerType {
    pub const ALL: [Self; 2] = [Self::Government, Self::Corporate];

    #[must_use]
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            Self::Government => "government",
            Self::Corporate => "corporate",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Government => "Government",
            Self::Corporate => "Corporate",
        }
    }
}

impl fmt::Display for IssuerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IssuerType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "government" => Ok(Self::Government),
            "corporate" => Ok(Self::Corporate),
            _ => Err(FilterError::InvalidValue {
                field: "issuer_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Which trading venues the user kept selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "venues", rename_all = "lowercase")]
pub enum VenueSelection {
    /// Nothing submitted: every eligible venue.
    #[default]
    All,
    /// An explicit subset, possibly empty.
    Only(Vec<String>),
}

impl VenueSelection {
    /// Venues to filter by, given the venues eligible for the day. An
    /// explicit subset keeps only eligible venues and may stay empty.
    #[must_use]
    pub fn resolve(&self, eligible: &[String]) -> Vec<String> {
        match self {
            Self::All => eligible.to_vec(),
            Self::Only(venues) => venues
                .iter()
                .filter(|v| eligible.contains(v))
                .cloned()
                .collect(),
        }
    }
}

/// Everything the user picked on the page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterState {
    pub mode: ViewMode,
    /// Explicit reporting date; `None` defers to the reporting date policy.
    pub date: Option<NaiveDate>,
    pub issuer_type: Option<IssuerType>,
    pub country: Option<String>,
    /// Upper-cased, trimmed ISIN text. Empty when nothing was entered.
    pub isin: String,
    pub venues: VenueSelection,
    /// Reporting date the venue widget was rendered for.
    pub venues_date: Option<NaiveDate>,
}

impl FilterState {
    /// Parses URL query pairs. `venues` may repeat; `venues_set` marks a
    /// submitted venue widget so that an empty selection stays empty, and
    /// `venues_date` names the day whose venues were on offer.
    ///
    /// # Errors
    /// Returns `FilterError::InvalidValue` for an unknown view, issuer type or
    /// a malformed date.
    pub fn from_query_pairs(pairs: &[(String, String)]) -> Result<Self, FilterError> {
        let mut state = Self::default();
        let mut venues = Vec::new();
        let mut venues_set = false;

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "view" if !value.is_empty() => state.mode = value.parse()?,
                "date" if !value.is_empty() => state.date = Some(parse_date("date", value)?),
                "venues_date" if !value.is_empty() => {
                    state.venues_date = Some(parse_date("venues_date", value)?);
                }
                "issuer_type" if !value.is_empty() => state.issuer_type = Some(value.parse()?),
                "country" if !value.is_empty() => state.country = Some(value.to_string()),
                "isin" => state.isin = value.to_ascii_uppercase(),
                "venues" if !value.is_empty() => {
                    if !venues.iter().any(|v| v == value) {
                        venues.push(value.to_string());
                    }
                }
                "venues_set" => venues_set = true,
                _ => {}
            }
        }

        if venues_set || !venues.is_empty() {
            state.venues = VenueSelection::Only(venues);
        }

        Ok(state)
    }

    #[must_use]
    pub fn has_isin(&self) -> bool {
        !self.isin.is_empty()
    }

    /// Venue selection that applies on `date`. A selection made for another
    /// day no longer applies and falls back to every eligible venue.
    #[must_use]
    pub fn venues_on(&self, date: NaiveDate) -> VenueSelection {
        match self.venues_date {
            Some(rendered) if rendered != date => VenueSelection::All,
            _ => self.venues.clone(),
        }
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| FilterError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

/// Segment of the market used by the asset class view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentFilter {
    pub country: String,
    pub issuer_type: IssuerType,
    pub window: TimeWindow,
    pub venues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_query_gives_defaults() {
        let state = FilterState::from_query_pairs(&[]).unwrap();
        assert_eq!(state, FilterState::default());
        assert_eq!(state.mode, ViewMode::PerIssue);
        assert_eq!(state.venues, VenueSelection::All);
        assert!(!state.has_isin());
    }

    #[test]
    fn parses_full_asset_class_query() {
        let state = FilterState::from_query_pairs(&pairs(&[
            ("view", "asset-class"),
            ("date", "2023-06-02"),
            ("issuer_type", "Corporate"),
            ("country", "Germany"),
            ("venues", "TREU"),
            ("venues", "BMTF"),
            ("venues", "TREU"),
        ]))
        .unwrap();

        assert_eq!(state.mode, ViewMode::AssetClass);
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2023, 6, 2));
        assert_eq!(state.issuer_type, Some(IssuerType::Corporate));
        assert_eq!(state.country.as_deref(), Some("Germany"));
        assert_eq!(
            state.venues,
            VenueSelection::Only(vec!["TREU".to_string(), "BMTF".to_string()])
        );
    }

    #[test]
    fn isin_is_trimmed_and_uppercased() {
        let state =
            FilterState::from_query_pairs(&pairs(&[("isin", "  xs0000000000 ")])).unwrap();
        assert_eq!(state.isin, "XS0000000000");
        assert!(state.has_isin());
    }

    #[test]
    fn venue_marker_without_venues_is_explicitly_empty() {
        let state = FilterState::from_query_pairs(&pairs(&[("venues_set", "1")])).unwrap();
        assert_eq!(state.venues, VenueSelection::Only(vec![]));

        let eligible = vec!["BMTF".to_string()];
        assert!(state.venues.resolve(&eligible).is_empty());
        assert_eq!(VenueSelection::All.resolve(&eligible), eligible);
    }

    #[test]
    fn ineligible_venues_are_dropped() {
        let eligible = vec!["BMTF".to_string(), "TREU".to_string()];
        let selection = VenueSelection::Only(vec!["ZZZZ".to_string(), "TREU".to_string()]);
        assert_eq!(selection.resolve(&eligible), vec!["TREU".to_string()]);

        let only_unknown = VenueSelection::Only(vec!["ZZZZ".to_string()]);
        assert!(only_unknown.resolve(&eligible).is_empty());
    }

    #[test]
    fn selection_for_another_day_falls_back_to_all() {
        let state = FilterState::from_query_pairs(&pairs(&[
            ("date", "2023-06-05"),
            ("venues_set", "1"),
            ("venues_date", "2023-06-02"),
            ("venues", "TREU"),
        ]))
        .unwrap();
        let old_day = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        let new_day = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();

        assert_eq!(state.venues_date, Some(old_day));
        assert_eq!(state.venues_on(new_day), VenueSelection::All);
        assert_eq!(
            state.venues_on(old_day),
            VenueSelection::Only(vec!["TREU".to_string()])
        );
    }

    #[test]
    fn rejects_malformed_venues_date() {
        let err =
            FilterState::from_query_pairs(&pairs(&[("venues_date", "yesterday")])).unwrap_err();
        assert!(err.to_string().contains("venues_date"));
    }

    #[test]
    fn rejects_unknown_view() {
        let err = FilterState::from_query_pairs(&pairs(&[("view", "bogus")])).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidValue {
                field: "view",
                value: "bogus".to_string()
            }
        );
    }

    #[test]
    fn rejects_malformed_date() {
        let err = FilterState::from_query_pairs(&pairs(&[("date", "02/06/2023")])).unwrap_err();
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn issuer_type_db_values_are_lowercase() {
        assert_eq!(IssuerType::Government.as_db_str(), "government");
        assert_eq!("CORPORATE".parse::<IssuerType>(), Ok(IssuerType::Corporate));
    }
}
