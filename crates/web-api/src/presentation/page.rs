//! Server-rendered HTML for the dashboard.
//!
//! The page is a single GET form (view selector plus per-view filters)
//! followed by metric callouts, tables and Plotly charts. All text coming
//! from the database or the request is escaped.

use chrono::NaiveDate;
use compass_core::{IssuerType, ViewMode};
use compass_data::{BondRecord, IsinCount, VenueCoverageRow, VenueVolume, QUOTE_VENUE};
use std::fmt::Display;

use super::charts::Figure;
use crate::controller::{
    AssetClassView, Dashboard, DashboardView, HeadlineMetrics, IssueDetail, IssueFound,
    PerIssueView, Section, VenueCoverageView,
};

pub const NOT_FOUND_MESSAGE: &str = "No trades found. Please try a different ISIN.";
const INSTRUMENT_LINK_BASE: &str = "https://terrapinfinance.com";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 1.5rem 2rem; color: #1d2327; }
form { display: flex; flex-wrap: wrap; gap: 1rem; align-items: flex-end; margin-bottom: 1rem; }
label { display: flex; flex-direction: column; font-size: 0.85rem; gap: 0.25rem; }
.metrics { display: flex; gap: 2rem; margin: 1rem 0; }
.metric { border-left: 3px solid #2c7a7b; padding-left: 0.75rem; }
.metric .value { font-size: 1.6rem; font-weight: bold; }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(520px, 1fr)); gap: 1rem; }
table { border-collapse: collapse; margin-bottom: 1rem; }
th, td { border-bottom: 1px solid #ddd; padding: 0.25rem 0.75rem; text-align: left; }
.notice { background: #fff8e1; padding: 0.5rem 1rem; border-radius: 4px; }
.error { background: #fdecea; padding: 0.5rem 1rem; border-radius: 4px; }
.chart { min-height: 420px; }
";

/// Escapes text for HTML element and attribute content.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn selected(on: bool) -> &'static str {
    if on {
        " selected"
    } else {
        ""
    }
}

fn notice(text: &str) -> String {
    format!("<p class=\"notice\">{}</p>\n", escape(text))
}

fn section_error<T>(section: &Section<T>) -> String {
    section
        .error
        .as_deref()
        .map(|e| format!("<p class=\"error\">{}</p>\n", escape(e)))
        .unwrap_or_default()
}

fn cell(value: Option<impl Display>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// A plain table; cells are escaped here.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table>\n<thead><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str(&format!("<td>{}</td>", escape(value)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Chart container plus the script that draws it.
fn chart(id: &str, figure: &Figure) -> String {
    let json = match serde_json::to_string(figure) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            tracing::warn!(chart = id, error = %e, "failed to serialize chart");
            return String::new();
        }
    };
    format!(
        "<div id=\"{id}\" class=\"chart\"></div>\n\
         <script>(function () {{ const fig = {json}; \
         Plotly.newPlot(\"{id}\", fig.data, fig.layout, {{responsive: true}}); }})();</script>\n"
    )
}

fn metric(label: &str, value: i64) -> String {
    format!(
        "<div class=\"metric\"><div>{}</div><div class=\"value\">{value}</div></div>",
        escape(label)
    )
}

fn metrics(section: &Section<HeadlineMetrics>, date: &str) -> String {
    if section.failed() {
        return section_error(section);
    }
    let HeadlineMetrics { day, month } = section.data;
    format!(
        "<div class=\"metrics\">{}{}{}{}{}{}</div>\n",
        metric(&format!("ISINs traded on {date}"), day.isin_count),
        metric(&format!("Trades on {date}"), day.trade_count),
        metric(&format!("Venues active on {date}"), day.venue_count),
        metric("ISINs traded, trailing month", month.isin_count),
        metric("Trades, trailing month", month.trade_count),
        metric("Venues active, trailing month", month.venue_count),
    )
}

fn view_selector(mode: ViewMode) -> String {
    let mut html = String::from(
        "<label>Choose a dashboard:<select name=\"view\" onchange=\"this.form.submit()\">",
    );
    for option in ViewMode::ALL {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            option.as_str(),
            selected(option == mode),
            option.label()
        ));
    }
    html.push_str("</select></label>");
    html
}

fn issuer_select(current: Option<IssuerType>, allow_all: bool) -> String {
    let mut html = String::from("<label>Issuer type<select name=\"issuer_type\">");
    if allow_all {
        html.push_str(&format!(
            "<option value=\"\"{}>All</option>",
            selected(current.is_none())
        ));
    }
    for option in IssuerType::ALL {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            option.as_db_str(),
            selected(current == Some(option)),
            option.label()
        ));
    }
    html.push_str("</select></label>");
    html
}

fn country_select(countries: &[String], current: Option<&str>) -> String {
    let mut html = String::from("<label>Country<select name=\"country\">");
    for country in countries {
        let value = escape(country);
        html.push_str(&format!(
            "<option value=\"{value}\"{}>{value}</option>",
            selected(Some(country.as_str()) == current)
        ));
    }
    html.push_str("</select></label>");
    html
}

/// Collapsible multi-select; the hidden markers keep an empty selection
/// empty and tie the selection to the day it was offered for.
fn venue_select(eligible: &[String], chosen: &[String], date: NaiveDate) -> String {
    let size = eligible.len().clamp(1, 12);
    let date = date.format("%Y-%m-%d");
    let mut html = format!(
        "<details><summary>Eligible venues</summary>\
         <input type=\"hidden\" name=\"venues_set\" value=\"1\">\
         <input type=\"hidden\" name=\"venues_date\" value=\"{date}\">\
         <select name=\"venues\" multiple size=\"{size}\">"
    );
    for venue in eligible {
        let value = escape(venue);
        html.push_str(&format!(
            "<option value=\"{value}\"{}>{value}</option>",
            selected(chosen.contains(venue))
        ));
    }
    html.push_str("</select></details>");
    html
}

fn filter_form(dashboard: &Dashboard) -> String {
    let mut html = String::from("<form method=\"get\" action=\"/\">");
    html.push_str(&view_selector(dashboard.filter.mode));
    html.push_str(&format!(
        "<label>Date<input type=\"date\" name=\"date\" value=\"{}\"></label>",
        dashboard.date.format("%Y-%m-%d")
    ));

    match &dashboard.view {
        DashboardView::PerIssue(view) => {
            html.push_str(&format!(
                "<label>Input an ISIN to visualise trades and quotes\
                 <input type=\"text\" name=\"isin\" value=\"{}\"></label>",
                escape(&dashboard.filter.isin)
            ));
            html.push_str(&issuer_select(dashboard.filter.issuer_type, true));
            html.push_str(&venue_select(
                &view.eligible_venues.data,
                &view.selected_venues,
                dashboard.date,
            ));
        }
        DashboardView::AssetClass(view) => {
            html.push_str(&issuer_select(Some(view.issuer_type), false));
            html.push_str(&country_select(&view.countries.data, view.country.as_deref()));
            html.push_str(&venue_select(
                &view.eligible_venues.data,
                &view.selected_venues,
                dashboard.date,
            ));
        }
        DashboardView::VenueCoverage(_) => {}
    }

    html.push_str("<button type=\"submit\">Update</button></form>\n");
    html
}

fn ranking(title: &str, section: &Section<Vec<IsinCount>>) -> String {
    let rows: Vec<Vec<String>> = section
        .data
        .iter()
        .map(|r| vec![r.isin.clone(), r.how_many.to_string()])
        .collect();
    format!(
        "<h4>{}</h4>\n{}{}",
        escape(title),
        section_error(section),
        table(&["isin", "how_many"], &rows)
    )
}

fn bond_table(bond: &BondRecord) -> String {
    let row = vec![
        cell(bond.ticker.as_ref()),
        cell(bond.issuer.as_ref()),
        cell(bond.coupon),
        cell(bond.maturity_date),
        cell(bond.currency.as_ref()),
        cell(bond.issuer_type.as_ref()),
        cell(bond.asset_class.as_ref()),
        cell(bond.tp_sector.as_ref()),
    ];
    table(
        &[
            "ticker",
            "issuer",
            "coupon",
            "maturity_date",
            "currency",
            "issuer_type",
            "asset_class",
            "tp_sector",
        ],
        &[row],
    )
}

fn issue_found(found: &IssueFound) -> String {
    let mut html = String::new();
    html.push_str(&section_error(&found.bond));
    if let Some(bond) = &found.bond.data {
        html.push_str(&bond_table(bond));
    }
    let isin = escape(&found.isin);
    html.push_str(&format!(
        "<p>For more info on this instrument visit \
         <a href=\"{INSTRUMENT_LINK_BASE}/{isin}\">{INSTRUMENT_LINK_BASE}/{isin}</a></p>\n"
    ));
    html.push_str(&format!(
        "<p><strong>Note:</strong> quotes are only from Boerse Frankfurt ({QUOTE_VENUE}). \
         Trades from all eligible venues are shown.</p>\n"
    ));
    if !found.trading_venues.is_empty() {
        html.push_str(&format!(
            "<p>Traded on: {}</p>\n",
            escape(&found.trading_venues.join(", "))
        ));
    }
    html.push_str("<div class=\"grid\">\n");
    html.push_str(&chart("issue-prices", &found.price_chart));
    html.push_str(&chart("issue-volumes", &found.volume_chart));
    html.push_str("</div>\n");
    html
}

fn per_issue(view: &PerIssueView, date: &str) -> String {
    let mut html = String::from("<div class=\"grid\">\n<div>\n");
    html.push_str(&ranking(&format!("Most traded ISINs on {date}"), &view.most_traded));
    html.push_str(&ranking(&format!("Most quoted ISINs on {date}"), &view.most_quoted));
    html.push_str("</div>\n<div>\n");
    html.push_str(&section_error(&view.eligible_venues));
    match &view.detail {
        IssueDetail::Empty => {}
        IssueDetail::NotFound { .. } => html.push_str(&notice(NOT_FOUND_MESSAGE)),
        IssueDetail::Failed { error, .. } => {
            html.push_str(&format!("<p class=\"error\">{}</p>\n", escape(error)));
        }
        IssueDetail::Found(found) => html.push_str(&issue_found(found)),
    }
    html.push_str("</div>\n</div>\n");
    html
}

fn venue_volume_table(rows: &[VenueVolume]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.venue.clone(),
                r.how_many.to_string(),
                r.total_quantity.map(|q| q.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    table(&["Venue", "Number of trades", "Volume"], &rows)
}

fn asset_class(view: &AssetClassView) -> String {
    let mut html = String::new();
    html.push_str(&section_error(&view.countries));
    html.push_str(&section_error(&view.eligible_venues));
    if let Some(error) = &view.series_error {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", escape(error)));
    }
    html.push_str(&section_error(&view.per_venue));
    if view.country.is_none() {
        html.push_str(&notice("No countries with trades are available."));
        return html;
    }
    html.push_str("<div class=\"grid\">\n");
    html.push_str(&chart("trades-over-time", &view.trades_over_time));
    html.push_str(&chart("volume-over-time", &view.volume_over_time));
    html.push_str(&chart("trades-per-venue", &view.trades_per_venue));
    html.push_str(&chart("volume-per-venue", &view.volume_per_venue));
    html.push_str("</div>\n");
    html.push_str(&venue_volume_table(&view.per_venue.data));
    html
}

fn coverage_table(title: &str, section: &Section<Vec<VenueCoverageRow>>) -> String {
    let rows: Vec<Vec<String>> = section
        .data
        .iter()
        .map(|r| {
            vec![
                r.venue.clone(),
                r.name.clone().unwrap_or_default(),
                r.isin_count.to_string(),
                r.trade_count.to_string(),
            ]
        })
        .collect();
    format!(
        "<div><h4>{}</h4>\n{}{}</div>\n",
        escape(title),
        section_error(section),
        table(&["MIC", "Venue", "ISINs traded", "Trades"], &rows)
    )
}

fn venue_coverage(view: &VenueCoverageView) -> String {
    let from = view.window.start.format("%Y-%m-%d");
    let to = view.window.end.format("%Y-%m-%d");
    let mut html = format!("<p>Trailing month from {from} up to (not including) {to}.</p>\n");
    html.push_str("<div class=\"grid\">\n");
    html.push_str(&coverage_table("Government bonds", &view.government));
    html.push_str(&coverage_table("Corporate bonds", &view.corporate));
    html.push_str("</div>\n");
    html
}

/// Renders the whole page.
#[must_use]
pub fn render(dashboard: &Dashboard) -> String {
    let date = dashboard.date.format("%Y-%m-%d").to_string();
    let body = match &dashboard.view {
        DashboardView::PerIssue(view) => per_issue(view, &date),
        DashboardView::AssetClass(view) => asset_class(view),
        DashboardView::VenueCoverage(view) => venue_coverage(view),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Compass</title>\n<script src=\"{PLOTLY_JS}\"></script>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n\
         <h2>Compass</h2>\n\
         <p>Explore and analyse pre- and post-trade flow in European bond venues</p>\n\
         {form}<hr>\n{metrics}{body}</body>\n</html>\n",
        form = filter_form(dashboard),
        metrics = metrics(&dashboard.metrics, &date),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::charts;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">O'Neil & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;O&#39;Neil &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn chart_script_cannot_close_its_tag() {
        let figure = charts::bar_chart(
            "</script><script>alert(1)</script>",
            "x",
            "y",
            vec![],
            vec![],
        );
        let html = chart("c", &figure);
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn table_escapes_cells() {
        let html = table(&["a"], &[vec!["<b>".to_string()]]);
        assert!(html.contains("<td>&lt;b&gt;</td>"));
    }

    #[test]
    fn venue_select_marks_chosen_and_carries_marker() {
        let html = venue_select(
            &["BMTF".to_string(), "TREU".to_string()],
            &["TREU".to_string()],
            NaiveDate::from_ymd_opt(2023, 6, 2).unwrap(),
        );
        assert!(html.contains("name=\"venues_set\""));
        assert!(html.contains("name=\"venues_date\" value=\"2023-06-02\""));
        assert!(html.contains("<option value=\"TREU\" selected>"));
        assert!(html.contains("<option value=\"BMTF\">"));
    }
}
