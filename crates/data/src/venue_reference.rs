//! Static venue reference loaded from a CSV of market identifier codes.
//!
//! The file follows the ISO 10383 export layout (a `MIC` column and a
//! `MARKET NAME-INSTITUTION DESCRIPTION` column) but any CSV with a `MIC`
//! column and an `INSTITUTION` or `NAME` column is accepted.

use crate::error::DataAccessError;
use crate::models::VenueActivity;
use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const MIC_HEADERS: [&str; 2] = ["MIC", "OPERATING MIC"];
const NAME_HEADERS: [&str; 4] = [
    "MARKET NAME-INSTITUTION DESCRIPTION",
    "INSTITUTION",
    "NAME",
    "MARKET NAME",
];

/// MIC to institution name.
#[derive(Debug, Clone, Default)]
pub struct VenueReference {
    names: HashMap<String, String>,
}

/// One venue coverage table row: activity joined with the institution name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueCoverageRow {
    pub venue: String,
    pub name: Option<String>,
    pub isin_count: i64,
    pub trade_count: i64,
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(candidate))
    })
}

impl VenueReference {
    /// Loads the reference file from disk.
    ///
    /// # Errors
    /// Returns `DataAccessError::VenueFile` if the file cannot be opened or
    /// lacks the expected columns.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataAccessError> {
        let path = path.as_ref();
        let to_error = |message: String| DataAccessError::VenueFile {
            path: path.display().to_string(),
            message,
        };
        let file = File::open(path).map_err(|e| to_error(e.to_string()))?;
        let reference = Self::from_reader(file).map_err(to_error)?;
        tracing::info!(
            path = %path.display(),
            venues = reference.len(),
            "loaded venue reference"
        );
        Ok(reference)
    }

    /// Parses CSV content with a header row.
    ///
    /// # Errors
    /// Returns a description of the problem if the content is not valid CSV or
    /// lacks a MIC or name column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, String> {
        let mut csv = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv.headers().map_err(|e| e.to_string())?.clone();
        let mic_col = find_column(&headers, &MIC_HEADERS).ok_or("missing MIC column")?;
        let name_col = find_column(&headers, &NAME_HEADERS).ok_or("missing name column")?;

        let mut names = HashMap::new();
        for record in csv.records() {
            let record = record.map_err(|e| e.to_string())?;
            let (Some(mic), Some(name)) = (record.get(mic_col), record.get(name_col)) else {
                continue;
            };
            let (mic, name) = (mic.trim(), name.trim());
            if mic.is_empty() || name.is_empty() {
                continue;
            }
            names
                .entry(mic.to_ascii_uppercase())
                .or_insert_with(|| name.to_string());
        }

        Ok(Self { names })
    }

    #[must_use]
    pub fn name(&self, mic: &str) -> Option<&str> {
        self.names.get(&mic.to_ascii_uppercase()).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Attaches institution names to per-venue activity, keeping row order.
    #[must_use]
    pub fn coverage(&self, activity: Vec<VenueActivity>) -> Vec<VenueCoverageRow> {
        activity
            .into_iter()
            .map(|row| VenueCoverageRow {
                name: self.name(&row.venue).map(str::to_string),
                venue: row.venue,
                isin_count: row.isin_count,
                trade_count: row.trade_count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISO_SAMPLE: &str = "\
MIC,OPERATING MIC,OPRT/SGMT,MARKET NAME-INSTITUTION DESCRIPTION,LEGAL ENTITY NAME
BMTF,BMTF,OPRT,BLOOMBERG TRADING FACILITY LIMITED,
TREU,TREU,OPRT,TRADEWEB EUROPE LIMITED,
MTSC,MTSC,OPRT,MTS S.P.A.,
";

    #[test]
    fn parses_iso_layout() {
        let reference = VenueReference::from_reader(ISO_SAMPLE.as_bytes()).unwrap();
        assert_eq!(reference.len(), 3);
        assert_eq!(
            reference.name("BMTF"),
            Some("BLOOMBERG TRADING FACILITY LIMITED")
        );
        assert_eq!(reference.name("treu"), Some("TRADEWEB EUROPE LIMITED"));
        assert_eq!(reference.name("XXXX"), None);
    }

    #[test]
    fn accepts_simple_two_column_layout() {
        let reference =
            VenueReference::from_reader("mic,name\nXLON,London Stock Exchange\n".as_bytes())
                .unwrap();
        assert_eq!(reference.name("XLON"), Some("London Stock Exchange"));
    }

    #[test]
    fn rejects_file_without_mic_column() {
        let err = VenueReference::from_reader("code,name\nXLON,LSE\n".as_bytes()).unwrap_err();
        assert!(err.contains("MIC"));
    }

    #[test]
    fn missing_file_is_a_venue_file_error() {
        let err = VenueReference::from_path("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, DataAccessError::VenueFile { .. }));
    }

    #[test]
    fn coverage_joins_names_and_keeps_unknown_venues() {
        let reference = VenueReference::from_reader(ISO_SAMPLE.as_bytes()).unwrap();
        let rows = reference.coverage(vec![
            VenueActivity {
                venue: "TREU".to_string(),
                isin_count: 120,
                trade_count: 900,
            },
            VenueActivity {
                venue: "ZZZZ".to_string(),
                isin_count: 1,
                trade_count: 2,
            },
        ]);

        assert_eq!(rows[0].name.as_deref(), Some("TRADEWEB EUROPE LIMITED"));
        assert_eq!(rows[0].trade_count, 900);
        assert_eq!(rows[1].venue, "ZZZZ");
        assert_eq!(rows[1].name, None);
    }
}
