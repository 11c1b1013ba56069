//! Per-view orchestration.
//!
//! Every request recomputes the active view from the current filter state:
//! queries run one after another through the (cached) data source and their
//! results are shaped into view models and chart figures. A failing query
//! only blanks its own section.

use chrono::NaiveDate;
use compass_core::{
    FilterState, IssuerType, ReportingDatePolicy, SegmentFilter, TimeWindow, ViewMode,
};
use compass_data::{
    ActivitySummary, BondRecord, DashboardSource, DataResult, IsinCount, IssueQuote, IssueTrade,
    VenueCoverageRow, VenueReference, VenueVolume,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::presentation::charts::{self, Figure};

/// Settings the controller needs from the application configuration.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub reporting_date: ReportingDatePolicy,
    pub histogram_bins: usize,
    pub default_country: String,
}

/// Result of one independently loaded part of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section<T> {
    pub data: T,
    /// Generic message shown instead of the data when loading failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Section<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

async fn load<T, F>(what: &'static str, query: F) -> Section<T>
where
    T: Default,
    F: Future<Output = DataResult<T>>,
{
    match query.await {
        Ok(data) => Section::ok(data),
        Err(e) => {
            tracing::warn!(section = what, error = %e, "section failed to load");
            Section {
                data: T::default(),
                error: Some(format!("Could not load {what}. Please try again.")),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HeadlineMetrics {
    pub day: ActivitySummary,
    pub month: ActivitySummary,
}

/// Full model of one rendered dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub filter: FilterState,
    pub date: NaiveDate,
    pub metrics: Section<HeadlineMetrics>,
    pub view: DashboardView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DashboardView {
    PerIssue(PerIssueView),
    AssetClass(AssetClassView),
    VenueCoverage(VenueCoverageView),
}

#[derive(Debug, Clone, Serialize)]
pub struct PerIssueView {
    pub most_traded: Section<Vec<IsinCount>>,
    pub most_quoted: Section<Vec<IsinCount>>,
    pub eligible_venues: Section<Vec<String>>,
    pub selected_venues: Vec<String>,
    pub detail: IssueDetail,
}

/// What the per-issue detail area shows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum IssueDetail {
    /// No ISIN entered: show nothing.
    Empty,
    /// An ISIN was entered but nothing traded or was quoted.
    NotFound { isin: String },
    Failed { isin: String, error: String },
    Found(Box<IssueFound>),
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueFound {
    pub isin: String,
    pub bond: Section<Option<BondRecord>>,
    pub trades: Vec<IssueTrade>,
    pub quotes: Vec<IssueQuote>,
    pub trading_venues: Vec<String>,
    pub price_chart: Figure,
    pub volume_chart: Figure,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetClassView {
    pub issuer_type: IssuerType,
    pub countries: Section<Vec<String>>,
    pub country: Option<String>,
    pub eligible_venues: Section<Vec<String>>,
    pub selected_venues: Vec<String>,
    pub per_venue: Section<Vec<VenueVolume>>,
    pub trade_count: usize,
    pub trades_over_time: Figure,
    pub volume_over_time: Figure,
    pub trades_per_venue: Figure,
    pub volume_per_venue: Figure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueCoverageView {
    pub window: TimeWindow,
    pub government: Section<Vec<VenueCoverageRow>>,
    pub corporate: Section<Vec<VenueCoverageRow>>,
}

/// Builds dashboards from a data source.
pub struct ViewController {
    source: Arc<dyn DashboardSource>,
    venues: Arc<VenueReference>,
    settings: DashboardSettings,
}

impl ViewController {
    #[must_use]
    pub fn new(
        source: Arc<dyn DashboardSource>,
        venues: Arc<VenueReference>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            source,
            venues,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Reporting date for `filter`: the user's pick or the policy's.
    #[must_use]
    pub fn reporting_date(&self, filter: &FilterState) -> NaiveDate {
        filter
            .date
            .unwrap_or_else(|| self.settings.reporting_date.today())
    }

    /// Recomputes the dashboard for the active view.
    pub async fn render(&self, filter: FilterState) -> Dashboard {
        let date = self.reporting_date(&filter);
        tracing::debug!(mode = filter.mode.as_str(), %date, "rendering dashboard");

        let metrics = self.headline_metrics(date).await;
        let view = match filter.mode {
            ViewMode::PerIssue => DashboardView::PerIssue(self.per_issue(&filter, date).await),
            ViewMode::AssetClass => {
                DashboardView::AssetClass(self.asset_class(&filter, date).await)
            }
            ViewMode::VenueCoverage => {
                DashboardView::VenueCoverage(self.venue_coverage(date).await)
            }
        };

        Dashboard {
            filter,
            date,
            metrics,
            view,
        }
    }

    async fn headline_metrics(&self, date: NaiveDate) -> Section<HeadlineMetrics> {
        load("headline metrics", async {
            let day = self.source.activity_summary(TimeWindow::day(date)).await?;
            let month = self
                .source
                .activity_summary(TimeWindow::trailing_month(date))
                .await?;
            DataResult::Ok(HeadlineMetrics { day, month })
        })
        .await
    }

    async fn per_issue(&self, filter: &FilterState, date: NaiveDate) -> PerIssueView {
        let window = TimeWindow::day(date);

        let most_traded = load(
            "most traded ISINs",
            self.source.most_traded(window, filter.issuer_type),
        )
        .await;
        let most_quoted = load("most quoted ISINs", self.source.most_quoted(window)).await;
        let eligible_venues = load("eligible venues", self.source.eligible_venues(window)).await;
        let selected_venues = filter.venues_on(date).resolve(&eligible_venues.data);

        let detail = if filter.has_isin() {
            self.issue_detail(&filter.isin, window, &selected_venues)
                .await
        } else {
            IssueDetail::Empty
        };

        PerIssueView {
            most_traded,
            most_quoted,
            eligible_venues,
            selected_venues,
            detail,
        }
    }

    async fn issue_detail(&self, isin: &str, window: TimeWindow, venues: &[String]) -> IssueDetail {
        let rows = async {
            let quotes = self.source.issue_quotes(isin, window).await?;
            let trades = self.source.issue_trades(isin, window, venues).await?;
            DataResult::Ok((quotes, trades))
        };
        let (quotes, trades) = match rows.await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(isin, error = %e, "issue detail failed to load");
                return IssueDetail::Failed {
                    isin: isin.to_string(),
                    error: "Could not load trades and quotes. Please try again.".to_string(),
                };
            }
        };

        if quotes.is_empty() && trades.is_empty() {
            return IssueDetail::NotFound {
                isin: isin.to_string(),
            };
        }

        let bond = load("instrument reference data", self.source.bond(isin)).await;
        let mut trading_venues: Vec<String> = trades.iter().map(|t| t.venue.clone()).collect();
        trading_venues.sort();
        trading_venues.dedup();

        let points = charts::issue_points(&trades, &quotes);
        IssueDetail::Found(Box::new(IssueFound {
            isin: isin.to_string(),
            bond,
            price_chart: charts::issue_prices(&points),
            volume_chart: charts::issue_volumes(&points, self.settings.histogram_bins),
            trades,
            quotes,
            trading_venues,
        }))
    }

    /// The requested country if given, else the configured default when
    /// known, else the first country listed.
    fn pick_country(&self, requested: Option<&str>, countries: &[String]) -> Option<String> {
        if let Some(country) = requested {
            return Some(country.to_string());
        }
        countries
            .iter()
            .find(|c| **c == self.settings.default_country)
            .or_else(|| countries.first())
            .cloned()
    }

    async fn asset_class(&self, filter: &FilterState, date: NaiveDate) -> AssetClassView {
        let window = TimeWindow::day(date);
        let issuer_type = filter.issuer_type.unwrap_or(IssuerType::Government);

        let countries = load("countries", self.source.countries()).await;
        let country = self.pick_country(filter.country.as_deref(), &countries.data);
        let eligible_venues = load("eligible venues", self.source.eligible_venues(window)).await;
        let selected_venues = filter.venues_on(date).resolve(&eligible_venues.data);

        let (points, per_venue, series_error) = match &country {
            Some(country) => {
                let segment = SegmentFilter {
                    country: country.clone(),
                    issuer_type,
                    window,
                    venues: selected_venues.clone(),
                };
                let points = load("trades", self.source.segment_trades(&segment)).await;
                let per_venue = load(
                    "trades per venue",
                    self.source.segment_trades_per_venue(&segment),
                )
                .await;
                let error = points.error.clone();
                (points.data, per_venue, error)
            }
            None => (Vec::new(), Section::ok(Vec::new()), None),
        };

        let bins = self.settings.histogram_bins;
        AssetClassView {
            issuer_type,
            countries,
            country,
            eligible_venues,
            selected_venues,
            trade_count: points.len(),
            trades_over_time: charts::trades_over_time(&points, bins),
            volume_over_time: charts::volume_over_time(&points, bins),
            trades_per_venue: charts::trades_per_venue(&per_venue.data),
            volume_per_venue: charts::volume_per_venue(&per_venue.data),
            per_venue,
            series_error,
        }
    }

    async fn venue_coverage(&self, date: NaiveDate) -> VenueCoverageView {
        let window = TimeWindow::trailing_month(date);
        let government = load(
            "government bond venue metrics",
            self.source.venue_activity(window, IssuerType::Government),
        )
        .await;
        let corporate = load(
            "corporate bond venue metrics",
            self.source.venue_activity(window, IssuerType::Corporate),
        )
        .await;

        VenueCoverageView {
            window,
            government: Section {
                data: self.venues.coverage(government.data),
                error: government.error,
            },
            corporate: Section {
                data: self.venues.coverage(corporate.data),
                error: corporate.error,
            },
        }
    }
}
