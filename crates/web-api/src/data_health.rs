//! Data health endpoint for monitoring feed freshness.
//!
//! `/api/data/health` reports, for the trade and quote tables, the latest
//! record time, the number of rows in the last 24 hours and a status derived
//! from how stale the latest record is.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// Freshness of one table.
#[derive(Debug, Clone, Serialize)]
pub struct SourceHealth {
    pub source: String,
    pub last_record: Option<DateTime<Utc>>,
    pub records_last_day: i64,
    pub staleness_seconds: Option<i64>,
    /// "healthy", "degraded" or "unhealthy".
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<SourceHealth>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub total_records_last_day: i64,
}

/// Staleness limits in seconds.
struct HealthThresholds {
    healthy: i64,
    degraded: i64,
}

const HOUR: i64 = 3_600;

impl HealthThresholds {
    fn for_source(source: &str) -> Self {
        match source {
            // Trades land once a day with the previous day's prints.
            "trades" => Self {
                healthy: 36 * HOUR,
                degraded: 72 * HOUR,
            },
            // DFRA quotes stream during the trading day.
            "quotes" => Self {
                healthy: 18 * HOUR,
                degraded: 72 * HOUR,
            },
            _ => Self {
                healthy: 24 * HOUR,
                degraded: 72 * HOUR,
            },
        }
    }
}

/// Table name and its timestamp column.
const SOURCES: [(&str, &str); 2] = [("trades", "trade_datetime"), ("quotes", "quote_datetime")];

fn determine_status(staleness_seconds: Option<i64>, thresholds: &HealthThresholds) -> String {
    match staleness_seconds {
        None => "unhealthy".to_string(),
        Some(s) if s <= thresholds.healthy => "healthy".to_string(),
        Some(s) if s <= thresholds.degraded => "degraded".to_string(),
        Some(_) => "unhealthy".to_string(),
    }
}

async fn query_source_health(
    pool: &PgPool,
    table: &str,
    column: &str,
) -> Result<SourceHealth, sqlx::Error> {
    // Identifiers come from SOURCES, never from the request.
    let query = format!(
        r#"
        SELECT
            MAX({column}) AS last_record,
            COUNT(*) FILTER (WHERE {column} > NOW() - INTERVAL '24 hours') AS records_last_day
        FROM {table}
        "#
    );

    let (last_record, records_last_day): (Option<DateTime<Utc>>, i64) =
        sqlx::query_as(&query).fetch_one(pool).await?;

    let staleness_seconds = last_record.map(|lr| (Utc::now() - lr).num_seconds());
    let status = determine_status(staleness_seconds, &HealthThresholds::for_source(table));

    Ok(SourceHealth {
        source: table.to_string(),
        last_record,
        records_last_day,
        staleness_seconds,
        status,
    })
}

#[derive(Clone)]
pub struct DataHealthState {
    pub pool: PgPool,
}

fn overall_status(sources: &[SourceHealth]) -> &'static str {
    if sources
        .iter()
        .any(|s| s.status == "unhealthy" && s.source == "trades")
    {
        "unhealthy"
    } else if sources.iter().any(|s| s.status != "healthy") {
        "degraded"
    } else {
        "healthy"
    }
}

/// GET /api/data/health
///
/// # Errors
/// Never fails at the HTTP level: a table that cannot be queried is
/// reported as unhealthy.
pub async fn data_health(
    State(state): State<DataHealthState>,
) -> Result<Json<DataHealthResponse>, StatusCode> {
    let mut sources = Vec::with_capacity(SOURCES.len());

    for (table, column) in SOURCES {
        match query_source_health(&state.pool, table, column).await {
            Ok(health) => sources.push(health),
            Err(e) => {
                tracing::error!(table, error = %e, "failed to query data health");
                sources.push(SourceHealth {
                    source: table.to_string(),
                    last_record: None,
                    records_last_day: 0,
                    staleness_seconds: None,
                    status: "unhealthy".to_string(),
                });
            }
        }
    }

    let count = |status: &str| sources.iter().filter(|s| s.status == status).count();
    let summary = HealthSummary {
        healthy: count("healthy"),
        degraded: count("degraded"),
        unhealthy: count("unhealthy"),
        total_records_last_day: sources.iter().map(|s| s.records_last_day).sum(),
    };

    Ok(Json(DataHealthResponse {
        status: overall_status(&sources).to_string(),
        timestamp: Utc::now(),
        sources,
        summary,
    }))
}
