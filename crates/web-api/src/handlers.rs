use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use compass_core::{FilterError, FilterState};
use std::sync::Arc;

use crate::controller::{Dashboard, ViewController};
use crate::presentation::page;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ViewController>,
}

fn bad_request(e: &FilterError) -> (StatusCode, String) {
    tracing::debug!(error = %e, "rejected filter state");
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Renders the HTML dashboard for the filter state in the query string.
///
/// # Errors
/// Returns `StatusCode::BAD_REQUEST` if a filter value cannot be parsed.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let filter = FilterState::from_query_pairs(&pairs).map_err(|e| bad_request(&e))?;
    let dashboard = state.controller.render(filter).await;
    Ok(Html(page::render(&dashboard)))
}

/// Same view model as the page, as JSON.
///
/// # Errors
/// Returns `StatusCode::BAD_REQUEST` if a filter value cannot be parsed.
pub async fn dashboard_json(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Dashboard>, (StatusCode, String)> {
    let filter = FilterState::from_query_pairs(&pairs).map_err(|e| bad_request(&e))?;
    Ok(Json(state.controller.render(filter).await))
}
