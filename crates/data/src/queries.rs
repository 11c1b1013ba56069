//! SQL templates for every dashboard query.
//!
//! Builders are pure: they turn filter values into SQL text with PostgreSQL
//! positional placeholders plus the values to bind, and never splice a
//! user-supplied value into the text. Venue lists bind as `text[]` and match
//! with `= ANY(..)`; builders that filter by venue return `None` when the list
//! is empty so the caller can answer with an empty result.

use chrono::{DateTime, Utc};
use compass_core::{IssuerType, SegmentFilter, TimeWindow};

use crate::models::ASSET_BACKED_SECURITY;

/// Number of rows in the most traded / most quoted rankings.
pub const RANKING_LIMIT: usize = 10;

/// Price type for prices quoted as a percentage of face value.
pub const PRICE_TYPE_PERCENT: &str = "PERC";

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Text(String),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
}

/// SQL text together with the values for `$1..$n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl BoundQuery {
    /// Registers a value and returns its placeholder.
    fn bind(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn bind_text(&mut self, value: impl Into<String>) -> String {
        self.bind(QueryParam::Text(value.into()))
    }

    /// Binds both window bounds and returns the half-open predicate on `column`.
    fn bind_window(&mut self, column: &str, window: TimeWindow) -> String {
        let start = self.bind(QueryParam::Timestamp(window.start));
        let end = self.bind(QueryParam::Timestamp(window.end));
        format!("{column} >= {start} AND {column} < {end}")
    }

    fn with_sql(mut self, sql: String) -> Self {
        self.sql = sql;
        self
    }
}

/// Venues with percent-priced trades in the window.
#[must_use]
pub fn eligible_venues(window: TimeWindow) -> BoundQuery {
    let mut q = BoundQuery::default();
    let in_window = q.bind_window("trade_datetime", window);
    let price_type = q.bind_text(PRICE_TYPE_PERCENT);
    let sql = format!(
        r"
        SELECT DISTINCT venue
        FROM trades
        WHERE {in_window}
          AND quantity > 0
          AND price_type = {price_type}
          AND venue IS NOT NULL
        ORDER BY venue ASC
        "
    );
    q.with_sql(sql)
}

/// Countries of bonds that traded at least once.
#[must_use]
pub fn countries() -> BoundQuery {
    BoundQuery::default().with_sql(
        r"
        SELECT DISTINCT country
        FROM bonds
        WHERE country IS NOT NULL
          AND EXISTS (SELECT 1 FROM trades WHERE trades.isin = bonds.isin)
        ORDER BY country ASC
        "
        .to_string(),
    )
}

/// Top ISINs by trade count, optionally for one issuer type, never
/// including asset-backed securities.
#[must_use]
pub fn most_traded(window: TimeWindow, issuer_type: Option<IssuerType>) -> BoundQuery {
    let mut q = BoundQuery::default();
    let in_window = q.bind_window("t.trade_datetime", window);
    let excluded = q.bind_text(ASSET_BACKED_SECURITY);
    let issuer_clause = issuer_type
        .map(|it| format!("AND b.issuer_type = {}", q.bind_text(it.as_db_str())))
        .unwrap_or_default();
    let sql = format!(
        r"
        SELECT t.isin, COUNT(*) AS how_many
        FROM trades t
        WHERE {in_window}
          AND EXISTS (
              SELECT 1 FROM bonds b
              WHERE b.isin = t.isin
                AND b.asset_class <> {excluded}
                {issuer_clause}
          )
        GROUP BY t.isin
        ORDER BY how_many DESC, t.isin ASC
        LIMIT {RANKING_LIMIT}
        "
    );
    q.with_sql(sql)
}

/// Top ISINs by quote count, never including asset-backed securities.
#[must_use]
pub fn most_quoted(window: TimeWindow) -> BoundQuery {
    let mut q = BoundQuery::default();
    let in_window = q.bind_window("qt.quote_datetime", window);
    let excluded = q.bind_text(ASSET_BACKED_SECURITY);
    let sql = format!(
        r"
        SELECT qt.isin, COUNT(*) AS how_many
        FROM quotes qt
        WHERE {in_window}
          AND qt.quantity > 0
          AND EXISTS (
              SELECT 1 FROM bonds b
              WHERE b.isin = qt.isin
                AND b.asset_class <> {excluded}
          )
        GROUP BY qt.isin
        ORDER BY how_many DESC, qt.isin ASC
        LIMIT {RANKING_LIMIT}
        "
    );
    q.with_sql(sql)
}

/// Shared WHERE clause for the asset class view, or `None` with no venues.
fn segment_predicate(q: &mut BoundQuery, filter: &SegmentFilter) -> Option<String> {
    if filter.venues.is_empty() {
        return None;
    }
    let in_window = q.bind_window("t.trade_datetime", filter.window);
    let country = q.bind_text(filter.country.as_str());
    let issuer_type = q.bind_text(filter.issuer_type.as_db_str());
    let venues = q.bind(QueryParam::TextArray(filter.venues.clone()));
    Some(format!(
        r"{in_window}
          AND t.venue = ANY({venues})
          AND EXISTS (
              SELECT 1 FROM bonds b
              WHERE b.isin = t.isin
                AND b.country = {country}
                AND b.issuer_type = {issuer_type}
          )"
    ))
}

/// Every trade in the segment with its display quantity.
#[must_use]
pub fn segment_trades(filter: &SegmentFilter) -> Option<BoundQuery> {
    let mut q = BoundQuery::default();
    let predicate = segment_predicate(&mut q, filter)?;
    let sql = format!(
        r"
        SELECT t.trade_datetime::timestamptz AS trade_datetime,
               GREATEST(t.quantity, t.notional_amount)::numeric AS quantity
        FROM trades t
        WHERE {predicate}
        ORDER BY t.trade_datetime ASC
        "
    );
    Some(q.with_sql(sql))
}

/// Trade count and summed display quantity per venue in the segment.
#[must_use]
pub fn segment_trades_per_venue(filter: &SegmentFilter) -> Option<BoundQuery> {
    let mut q = BoundQuery::default();
    let predicate = segment_predicate(&mut q, filter)?;
    let sql = format!(
        r"
        SELECT t.venue,
               COUNT(*) AS how_many,
               SUM(GREATEST(t.quantity, t.notional_amount))::numeric AS total_quantity
        FROM trades t
        WHERE {predicate}
        GROUP BY t.venue
        ORDER BY t.venue ASC
        "
    );
    Some(q.with_sql(sql))
}

/// Percent-priced trades of one instrument on the selected venues.
#[must_use]
pub fn issue_trades(isin: &str, window: TimeWindow, venues: &[String]) -> Option<BoundQuery> {
    if venues.is_empty() {
        return None;
    }
    let mut q = BoundQuery::default();
    let isin = q.bind_text(isin);
    let in_window = q.bind_window("trade_datetime", window);
    let price_type = q.bind_text(PRICE_TYPE_PERCENT);
    let venues = q.bind(QueryParam::TextArray(venues.to_vec()));
    let sql = format!(
        r"
        SELECT trade_datetime::timestamptz AS timestamp,
               price::numeric AS price,
               quantity::numeric AS quantity,
               notional_amount::numeric AS notional_amount,
               venue,
               source
        FROM trades
        WHERE isin = {isin}
          AND {in_window}
          AND price_type = {price_type}
          AND price IS NOT NULL
          AND venue = ANY({venues})
        ORDER BY trade_datetime ASC
        "
    );
    Some(q.with_sql(sql))
}

/// Positive-priced quotes of one instrument.
#[must_use]
pub fn issue_quotes(isin: &str, window: TimeWindow) -> BoundQuery {
    let mut q = BoundQuery::default();
    let isin = q.bind_text(isin);
    let in_window = q.bind_window("quote_datetime", window);
    let sql = format!(
        r"
        SELECT quote_datetime::timestamptz AS timestamp,
               price::numeric AS price,
               quantity::numeric AS quantity,
               COALESCE(side, 'quote') AS side,
               source
        FROM quotes
        WHERE isin = {isin}
          AND {in_window}
          AND price > 0
        ORDER BY quote_datetime ASC
        "
    );
    q.with_sql(sql)
}

/// Static reference row for one instrument.
#[must_use]
pub fn bond(isin: &str) -> BoundQuery {
    let mut q = BoundQuery::default();
    let isin = q.bind_text(isin);
    let sql = format!(
        r"
        SELECT isin, ticker, issuer, coupon::numeric AS coupon,
               maturity_date::date AS maturity_date, currency, issuer_type,
               asset_class, country, tp_sector
        FROM bonds
        WHERE isin = {isin}
        LIMIT 1
        "
    );
    q.with_sql(sql)
}

/// Distinct instruments, trades and venues in the window.
#[must_use]
pub fn activity_summary(window: TimeWindow) -> BoundQuery {
    let mut q = BoundQuery::default();
    let in_window = q.bind_window("trade_datetime", window);
    let sql = format!(
        r"
        SELECT COUNT(DISTINCT isin) AS isin_count,
               COUNT(*) AS trade_count,
               COUNT(DISTINCT venue) AS venue_count
        FROM trades
        WHERE {in_window}
        "
    );
    q.with_sql(sql)
}

/// Distinct instruments and trades per venue for one issuer type.
#[must_use]
pub fn venue_activity(window: TimeWindow, issuer_type: IssuerType) -> BoundQuery {
    let mut q = BoundQuery::default();
    let in_window = q.bind_window("t.trade_datetime", window);
    let issuer_type = q.bind_text(issuer_type.as_db_str());
    let sql = format!(
        r"
        SELECT t.venue,
               COUNT(DISTINCT t.isin) AS isin_count,
               COUNT(*) AS trade_count
        FROM trades t
        JOIN bonds b ON b.isin = t.isin
        WHERE {in_window}
          AND b.issuer_type = {issuer_type}
          AND t.venue IS NOT NULL
        GROUP BY t.venue
        ORDER BY trade_count DESC, t.venue ASC
        "
    );
    q.with_sql(sql)
}
