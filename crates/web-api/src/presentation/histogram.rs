//! Equal-width time binning for histogram charts.

use chrono::{DateTime, TimeDelta, Utc};

/// How values falling in the same bin are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Count,
    Sum,
}

/// `bins` equal-width buckets starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binning {
    start: DateTime<Utc>,
    width_ms: i64,
    bins: usize,
}

impl Binning {
    /// Bins covering every timestamp given, or `None` when there are none.
    /// Several series can share one `Binning` so their bars line up.
    pub fn spanning<I>(timestamps: I, bins: usize) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let (min, max) = timestamps
            .into_iter()
            .fold(None, |acc: Option<(DateTime<Utc>, DateTime<Utc>)>, ts| {
                Some(acc.map_or((ts, ts), |(lo, hi)| (lo.min(ts), hi.max(ts))))
            })?;

        let span_ms = (max - min).num_milliseconds();
        let bins = if span_ms == 0 { 1 } else { bins.max(1) };
        let count = i64::try_from(bins).unwrap_or(i64::MAX);
        let width_ms = ((span_ms + count - 1) / count).max(1);

        Some(Self {
            start: min,
            width_ms,
            bins,
        })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bins
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bins == 0
    }

    #[must_use]
    pub fn width(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.width_ms)
    }

    /// Left edge of every bin.
    #[must_use]
    pub fn edges(&self) -> Vec<DateTime<Utc>> {
        (0..self.bins)
            .map(|i| self.start + TimeDelta::milliseconds(self.width_ms * i as i64))
            .collect()
    }

    fn index(&self, ts: DateTime<Utc>) -> Option<usize> {
        let offset = (ts - self.start).num_milliseconds();
        if offset < 0 {
            return None;
        }
        let idx = usize::try_from(offset / self.width_ms).unwrap_or(usize::MAX);
        Some(idx.min(self.bins - 1))
    }

    /// Aggregates `(timestamp, value)` points into one value per bin. Points
    /// before the first edge are ignored; missing values count as one
    /// observation and add nothing to a sum.
    #[must_use]
    pub fn accumulate(
        &self,
        points: &[(DateTime<Utc>, Option<f64>)],
        aggregation: Aggregation,
    ) -> Vec<f64> {
        let mut totals = vec![0.0; self.bins];
        for (ts, value) in points {
            let Some(idx) = self.index(*ts) else {
                continue;
            };
            totals[idx] += match aggregation {
                Aggregation::Count => 1.0,
                Aggregation::Sum => value.unwrap_or(0.0),
            };
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 2, h, m, 0).unwrap()
    }

    #[test]
    fn no_timestamps_no_bins() {
        assert_eq!(Binning::spanning(Vec::new(), 50), None);
    }

    #[test]
    fn single_timestamp_gets_one_bin() {
        let binning = Binning::spanning([at(9, 0), at(9, 0)], 50).unwrap();
        assert_eq!(binning.len(), 1);
        let counts =
            binning.accumulate(&[(at(9, 0), None), (at(9, 0), None)], Aggregation::Count);
        assert_eq!(counts, vec![2.0]);
    }

    #[test]
    fn counts_cover_every_point_including_the_last() {
        let points: Vec<_> = [at(8, 0), at(8, 30), at(12, 0), at(17, 59), at(18, 0)]
            .into_iter()
            .map(|ts| (ts, Some(1.0)))
            .collect();
        let binning = Binning::spanning(points.iter().map(|(ts, _)| *ts), 10).unwrap();

        let counts = binning.accumulate(&points, Aggregation::Count);
        assert_eq!(counts.len(), 10);
        assert!((counts.iter().sum::<f64>() - 5.0).abs() < f64::EPSILON);
        assert!((counts[0] - 2.0).abs() < f64::EPSILON);
        assert!((counts[9] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sums_quantities_per_bin() {
        let points = vec![
            (at(10, 0), Some(100_000.0)),
            (at(10, 5), Some(250_000.0)),
            (at(11, 0), None),
            (at(12, 0), Some(50_000.0)),
        ];
        let binning = Binning::spanning(points.iter().map(|(ts, _)| *ts), 2).unwrap();

        let sums = binning.accumulate(&points, Aggregation::Sum);
        assert_eq!(sums, vec![350_000.0, 50_000.0]);
    }

    #[test]
    fn shared_binning_aligns_series() {
        let trades = vec![(at(9, 0), Some(1.0))];
        let quotes = vec![(at(15, 0), Some(1.0))];
        let binning = Binning::spanning(
            trades.iter().chain(quotes.iter()).map(|(ts, _)| *ts),
            6,
        )
        .unwrap();

        assert_eq!(binning.edges()[0], at(9, 0));
        assert_eq!(binning.width(), TimeDelta::hours(1));
        assert_eq!(binning.accumulate(&trades, Aggregation::Count)[0], 1.0);
        assert_eq!(binning.accumulate(&quotes, Aggregation::Count)[5], 1.0);
    }

    #[test]
    fn points_before_start_are_ignored() {
        let binning = Binning::spanning([at(10, 0), at(11, 0)], 2).unwrap();
        let counts = binning.accumulate(&[(at(9, 0), None)], Aggregation::Count);
        assert_eq!(counts, vec![0.0, 0.0]);
    }
}
