//! Optional TMDB detail enrichment.
//!
//! Fills poster/backdrop URLs, overview, genres and vote average on a
//! feature before it is embedded in a response. Strictly best-effort: any
//! failure (no key, network, bad payload) leaves the feature untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cusswatch_model::{ContentType, Feature};

use crate::cache::{self, Cache, CacheKeys, ttl};
use crate::settings::TmdbSettings;

pub struct TmdbClient {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: TmdbSettings,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    number_of_seasons: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

/// Cached, already-mapped subset of TMDB details.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Details {
    overview: Option<String>,
    vote_average: Option<f64>,
    genres: Vec<String>,
    poster_url: Option<String>,
    backdrop_url: Option<String>,
    season_count: Option<u32>,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        cache: Arc<dyn Cache>,
        settings: TmdbSettings,
    ) -> Self {
        Self {
            client,
            cache,
            settings,
        }
    }

    /// Fill missing metadata on `feature` in place. Never fails.
    pub async fn enrich(&self, feature: &mut Feature) {
        let Some(details) =
            self.details(feature.content_type, feature.tmdb_id).await
        else {
            return;
        };

        if feature.overview.is_none() {
            feature.overview = details.overview;
        }
        if feature.vote_average.is_none() {
            feature.vote_average = details.vote_average;
        }
        if feature.genres.is_none() && !details.genres.is_empty() {
            feature.genres = Some(details.genres);
        }
        if feature.poster_url.is_none() {
            feature.poster_url = details.poster_url;
        }
        if feature.backdrop_url.is_none() {
            feature.backdrop_url = details.backdrop_url;
        }
        if feature.season_count.is_none() {
            feature.season_count = details.season_count;
        }
    }

    async fn details(
        &self,
        content_type: ContentType,
        tmdb_id: u64,
    ) -> Option<Details> {
        let api_key = self.settings.api_key.as_deref()?;

        let cache_key = CacheKeys::tmdb_details(content_type, tmdb_id);
        if let Some(cached) =
            cache::get_json::<Details>(self.cache.as_ref(), &cache_key).await
        {
            return Some(cached);
        }

        let path = match content_type {
            ContentType::Movie => format!("/movie/{tmdb_id}"),
            ContentType::Episode => format!("/tv/{tmdb_id}"),
        };
        let response = self
            .client
            .get(format!("{}{path}", self.settings.base_url))
            .query(&[("api_key", api_key)])
            .timeout(self.settings.request_timeout())
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            debug!(tmdb_id, status = %response.status(), "TMDB lookup failed");
            return None;
        }

        let payload: DetailsResponse = response.json().await.ok()?;
        let image = |size: &str, path: Option<String>| {
            path.map(|p| {
                format!("{}/{size}{p}", self.settings.image_base_url)
            })
        };
        let details = Details {
            overview: payload.overview,
            vote_average: payload.vote_average,
            genres: payload.genres.into_iter().map(|g| g.name).collect(),
            poster_url: image("w500", payload.poster_path),
            backdrop_url: image("w1280", payload.backdrop_path),
            season_count: payload.number_of_seasons,
        };

        cache::set_json(self.cache.as_ref(), &cache_key, &details, ttl::METADATA)
            .await;

        Some(details)
    }
}
