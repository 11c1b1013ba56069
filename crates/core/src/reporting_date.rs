//! Reporting calendar.
//!
//! Resolves which trading day the dashboard reports on and converts days into
//! half-open UTC time windows used by every query.

use chrono::{DateTime, Days, Months, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Chooses the reporting date when the user has not picked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum ReportingDatePolicy {
    /// Always report on the same day.
    Fixed { date: NaiveDate },
    /// Report on yesterday once the clock is past `cutover_hour`, otherwise on
    /// the day before yesterday, whose data is known to be fully ingested.
    Rolling { cutover_hour: u32 },
}

impl Default for ReportingDatePolicy {
    fn default() -> Self {
        Self::Rolling { cutover_hour: 8 }
    }
}

impl ReportingDatePolicy {
    /// Resolves the reporting date as seen at `now`.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> NaiveDate {
        match *self {
            Self::Fixed { date } => date,
            Self::Rolling { cutover_hour } => {
                let lag = if now.hour() > cutover_hour { 1 } else { 2 };
                now.date_naive() - Days::new(lag)
            }
        }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.resolve(Utc::now())
    }
}

/// Half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The calendar day `date`, midnight to midnight.
    #[must_use]
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: midnight(date),
            end: midnight(date + Days::new(1)),
        }
    }

    /// The calendar month ending with (and including) `date`.
    #[must_use]
    pub fn trailing_month(date: NaiveDate) -> Self {
        let start = date
            .checked_sub_months(Months::new(1))
            .map_or(date, |d| d + Days::new(1));
        Self {
            start: midnight(start),
            end: midnight(date + Days::new(1)),
        }
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fixed_policy_ignores_clock() {
        let policy = ReportingDatePolicy::Fixed {
            date: date(2023, 5, 23),
        };
        assert_eq!(policy.resolve(at(2024, 1, 1, 12)), date(2023, 5, 23));
    }

    #[test]
    fn rolling_policy_uses_yesterday_after_cutover() {
        let policy = ReportingDatePolicy::default();
        assert_eq!(policy.resolve(at(2023, 6, 3, 9)), date(2023, 6, 2));
    }

    #[test]
    fn rolling_policy_cutover_hour_itself_is_still_early() {
        let policy = ReportingDatePolicy::default();
        assert_eq!(policy.resolve(at(2023, 6, 3, 8)), date(2023, 6, 1));
        assert_eq!(policy.resolve(at(2023, 6, 3, 0)), date(2023, 6, 1));
    }

    #[test]
    fn day_window_is_half_open() {
        let window = TimeWindow::day(date(2023, 6, 2));
        assert_eq!(window.start, at(2023, 6, 2, 0));
        assert_eq!(window.end, at(2023, 6, 3, 0));
        assert!(window.contains(at(2023, 6, 2, 0)));
        assert!(window.contains(at(2023, 6, 2, 23)));
        assert!(!window.contains(at(2023, 6, 3, 0)));
    }

    #[test]
    fn trailing_month_ends_after_reporting_day() {
        let window = TimeWindow::trailing_month(date(2023, 6, 2));
        assert_eq!(window.start, at(2023, 5, 3, 0));
        assert_eq!(window.end, at(2023, 6, 3, 0));
    }

    #[test]
    fn trailing_month_clamps_short_months() {
        let window = TimeWindow::trailing_month(date(2023, 3, 31));
        assert_eq!(window.start, at(2023, 3, 1, 0));
    }

    #[test]
    fn policy_deserializes_from_tagged_form() {
        let policy: ReportingDatePolicy =
            serde_json::from_str(r#"{"policy":"rolling","cutover_hour":6}"#).unwrap();
        assert_eq!(policy, ReportingDatePolicy::Rolling { cutover_hour: 6 });
    }
}
