use axum::{Json, extract::Query, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::errors::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

/// `GET /api/search?q=` - free-text title search.
pub async fn search_titles(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Value>> {
    let query = params.q.trim();
    if query.len() < 2 {
        return Ok(Json(json!({ "results": [] })));
    }

    let results = state.catalog.search_titles(query).await?;
    info!(query, count = results.len(), "title search served");

    Ok(Json(json!({ "results": results })))
}
