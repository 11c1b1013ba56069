//! Plotly figure descriptions.
//!
//! Figures serialize to the JSON shape `Plotly.newPlot` expects, so the page
//! only has to embed them. Every chart type has fixed axis labels.

use chrono::{DateTime, SecondsFormat, Utc};
use compass_data::{IssueQuote, IssueTrade, VenueVolume, VolumePoint, QUOTE_VENUE, TRADE_SIDE};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::histogram::{Aggregation, Binning};

pub const DATE_AND_TIME: &str = "Date and time";
pub const NUMBER_OF_TRADES: &str = "Number of trades";
pub const VOLUME: &str = "Volume";
pub const VENUE: &str = "Venue";
pub const PRICE_PCT_OF_FACE: &str = "Price (pct of face value)";
pub const VOLUME_PER_INTERVAL: &str = "Total volume per time interval";

const MARKER_SYMBOLS: [&str; 5] = ["circle", "diamond", "square", "x", "triangle-up"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Bar,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub symbol: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Trace {
    fn bar(name: Option<String>, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            kind: TraceKind::Bar,
            name,
            x,
            y,
            mode: None,
            marker: None,
            hovertext: None,
            opacity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl From<&str> for Title {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    pub showgrid: bool,
}

impl Axis {
    fn labelled(label: &str) -> Self {
        Self {
            title: label.into(),
            showgrid: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bargap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    fn new(title: &str, x_label: &str, y_label: &str, data: Vec<Trace>) -> Self {
        Self {
            data,
            layout: Layout {
                title: title.into(),
                xaxis: Axis::labelled(x_label),
                yaxis: Axis::labelled(y_label),
                bargap: None,
                barmode: None,
            },
        }
    }

    /// True when no trace has any point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|trace| trace.x.is_empty())
    }
}

fn to_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|v| v.to_f64())
}

fn timestamp_label(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Category vs value bar chart.
#[must_use]
pub fn bar_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    categories: Vec<String>,
    values: Vec<f64>,
) -> Figure {
    Figure::new(
        title,
        x_label,
        y_label,
        vec![Trace::bar(None, categories, values)],
    )
}

/// Pre-binned histogram over time; one bar series per named group.
#[must_use]
pub fn time_histogram(
    title: &str,
    y_label: &str,
    binning: Option<Binning>,
    series: &[(Option<String>, Vec<(DateTime<Utc>, Option<f64>)>)],
    aggregation: Aggregation,
) -> Figure {
    let data = binning.map_or_else(Vec::new, |binning| {
        let edges: Vec<String> = binning.edges().into_iter().map(timestamp_label).collect();
        series
            .iter()
            .map(|(name, points)| {
                Trace::bar(name.clone(), edges.clone(), binning.accumulate(points, aggregation))
            })
            .collect()
    });

    let mut figure = Figure::new(title, DATE_AND_TIME, y_label, data);
    figure.layout.bargap = Some(0.1);
    if series.len() > 1 {
        figure.layout.barmode = Some("group");
    }
    figure
}

/// Number of trades per time period in a market segment.
#[must_use]
pub fn trades_over_time(points: &[VolumePoint], bins: usize) -> Figure {
    segment_histogram(
        "Number of trades per time period",
        NUMBER_OF_TRADES,
        points,
        bins,
        Aggregation::Count,
    )
}

/// Summed display quantity per time period in a market segment.
#[must_use]
pub fn volume_over_time(points: &[VolumePoint], bins: usize) -> Figure {
    segment_histogram(
        "Volume traded per time period",
        VOLUME,
        points,
        bins,
        Aggregation::Sum,
    )
}

fn segment_histogram(
    title: &str,
    y_label: &str,
    points: &[VolumePoint],
    bins: usize,
    aggregation: Aggregation,
) -> Figure {
    let values: Vec<_> = points
        .iter()
        .map(|p| (p.trade_datetime, to_f64(p.quantity)))
        .collect();
    let binning = Binning::spanning(values.iter().map(|(ts, _)| *ts), bins);
    time_histogram(title, y_label, binning, &[(None, values)], aggregation)
}

#[must_use]
pub fn trades_per_venue(rows: &[VenueVolume]) -> Figure {
    bar_chart(
        "Number of trades per venue",
        VENUE,
        NUMBER_OF_TRADES,
        rows.iter().map(|r| r.venue.clone()).collect(),
        rows.iter().map(|r| r.how_many as f64).collect(),
    )
}

#[must_use]
pub fn volume_per_venue(rows: &[VenueVolume]) -> Figure {
    bar_chart(
        "Volume traded per venue",
        VENUE,
        VOLUME,
        rows.iter().map(|r| r.venue.clone()).collect(),
        rows.iter()
            .map(|r| to_f64(r.total_quantity).unwrap_or(0.0))
            .collect(),
    )
}

/// A trade or quote reduced to what the per-issue charts plot.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub side: String,
    pub venue: String,
    pub source: String,
}

impl IssuePoint {
    fn hover(&self) -> String {
        format!(
            "{} | price {} | quantity {} | {} | {}",
            timestamp_label(self.timestamp),
            self.price.map_or_else(|| "-".to_string(), |p| p.to_string()),
            self.quantity.map_or_else(|| "-".to_string(), |q| q.to_string()),
            self.venue,
            self.source,
        )
    }
}

/// Quotes followed by trades, with trades labelled as their own side.
#[must_use]
pub fn issue_points(trades: &[IssueTrade], quotes: &[IssueQuote]) -> Vec<IssuePoint> {
    let quotes = quotes.iter().map(|q| IssuePoint {
        timestamp: q.timestamp,
        price: q.price.to_f64(),
        quantity: to_f64(q.quantity),
        side: q.side.clone(),
        venue: QUOTE_VENUE.to_string(),
        source: q.source.clone().unwrap_or_default(),
    });
    let trades = trades.iter().map(|t| IssuePoint {
        timestamp: t.timestamp,
        price: t.price.to_f64(),
        quantity: to_f64(t.display_quantity()),
        side: TRADE_SIDE.to_string(),
        venue: t.venue.clone(),
        source: t.source.clone().unwrap_or_default(),
    });
    quotes.chain(trades).collect()
}

/// Points grouped by side, groups in order of first appearance.
fn by_side(points: &[IssuePoint]) -> Vec<(String, Vec<&IssuePoint>)> {
    let mut groups: Vec<(String, Vec<&IssuePoint>)> = Vec::new();
    for point in points {
        match groups.iter_mut().find(|(side, _)| *side == point.side) {
            Some((_, members)) => members.push(point),
            None => groups.push((point.side.clone(), vec![point])),
        }
    }
    groups
}

/// Quote and trade prices over time, coloured and shaped by side.
#[must_use]
pub fn issue_prices(points: &[IssuePoint]) -> Figure {
    let data = by_side(points)
        .into_iter()
        .enumerate()
        .map(|(i, (side, members))| {
            let priced: Vec<&IssuePoint> =
                members.into_iter().filter(|p| p.price.is_some()).collect();
            Trace {
                kind: TraceKind::Scatter,
                name: Some(side),
                x: priced.iter().map(|p| timestamp_label(p.timestamp)).collect(),
                y: priced.iter().filter_map(|p| p.price).collect(),
                mode: Some("markers"),
                marker: Some(Marker {
                    symbol: MARKER_SYMBOLS[i % MARKER_SYMBOLS.len()],
                }),
                hovertext: Some(priced.iter().map(|p| p.hover()).collect()),
                opacity: Some(0.95),
            }
        })
        .collect();
    Figure::new("Quote and trade prices", DATE_AND_TIME, PRICE_PCT_OF_FACE, data)
}

/// Quote and trade volume per time interval, grouped by side.
#[must_use]
pub fn issue_volumes(points: &[IssuePoint], bins: usize) -> Figure {
    let binning = Binning::spanning(points.iter().map(|p| p.timestamp), bins);
    let series: Vec<_> = by_side(points)
        .into_iter()
        .map(|(side, members)| {
            let values: Vec<(DateTime<Utc>, Option<f64>)> =
                members.iter().map(|p| (p.timestamp, p.quantity)).collect();
            (Some(side), values)
        })
        .collect();
    let mut figure = time_histogram(
        "Quote and trade volume",
        VOLUME_PER_INTERVAL,
        binning,
        &series,
        Aggregation::Sum,
    );
    figure.layout.barmode = Some("group");
    figure
}
