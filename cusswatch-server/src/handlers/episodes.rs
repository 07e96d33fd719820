use axum::{Json, extract::Query, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EpisodesParams {
    tmdb_id: Option<u64>,
    season: Option<u32>,
}

/// `GET /api/episodes?tmdb_id=&season=` - season episode listing.
pub async fn list_episodes(
    State(state): State<AppState>,
    Query(params): Query<EpisodesParams>,
) -> AppResult<Json<Value>> {
    let (Some(tmdb_id), Some(season)) = (params.tmdb_id, params.season) else {
        return Err(AppError::bad_request(
            "tmdb_id and season are required",
        ));
    };

    let episodes = state.catalog.list_episodes(tmdb_id, season).await?;
    info!(tmdb_id, season, count = episodes.len(), "episode listing served");

    Ok(Json(json!({ "episodes": episodes })))
}
