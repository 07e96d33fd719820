//! Title and episode catalog lookups.
//!
//! Backed by the OpenSubtitles features/subtitles endpoints: title search
//! for the search box, and per-season episode listings derived from
//! subtitle metadata (deduplicated by episode number, counting available
//! subtitles per episode). Catalog lookups are serving-path calls, so
//! unlike provider searches their failures do propagate to the caller.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use cusswatch_model::{ContentType, EpisodeSummary, Feature};

use crate::cache::{self, Cache, CacheKeys, ttl};
use crate::providers::ProviderError;
use crate::settings::ProviderSettings;

const USER_AGENT: &str = "Cusswatch v1.0";

pub struct CatalogClient {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient").finish_non_exhaustive()
    }
}

/// OpenSubtitles renders numbers inconsistently across endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numberish {
    Int(i64),
    Text(String),
}

impl Numberish {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Numberish::Int(n) => u64::try_from(*n).ok(),
            Numberish::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeaturesResponse {
    #[serde(default)]
    data: Vec<FeatureItem>,
}

#[derive(Debug, Deserialize)]
struct FeatureItem {
    id: Numberish,
    attributes: FeatureAttributes,
}

#[derive(Debug, Deserialize)]
struct FeatureAttributes {
    #[serde(default)]
    feature_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    year: Option<Numberish>,
    #[serde(default)]
    imdb_id: Option<Numberish>,
    #[serde(default)]
    tmdb_id: Option<Numberish>,
    #[serde(default)]
    img_url: Option<String>,
    #[serde(default)]
    seasons_count: Option<Numberish>,
}

#[derive(Debug, Deserialize)]
struct SubtitlesResponse {
    #[serde(default)]
    data: Vec<SubtitleItem>,
}

#[derive(Debug, Deserialize)]
struct SubtitleItem {
    attributes: SubtitleAttributes,
}

#[derive(Debug, Deserialize)]
struct SubtitleAttributes {
    #[serde(default)]
    feature_details: Option<FeatureDetails>,
}

#[derive(Debug, Deserialize)]
struct FeatureDetails {
    #[serde(default)]
    episode_number: Option<u32>,
    #[serde(default)]
    title: Option<String>,
}

impl CatalogClient {
    pub fn new(
        client: reqwest::Client,
        cache: Arc<dyn Cache>,
        settings: Arc<ProviderSettings>,
    ) -> Self {
        Self {
            client,
            cache,
            settings,
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.settings
            .opensubtitles_api_key
            .as_deref()
            .ok_or_else(|| {
                ProviderError::Api("OpenSubtitles API key not configured".into())
            })
    }

    /// Search titles by free-text query.
    pub async fn search_titles(
        &self,
        query: &str,
    ) -> Result<Vec<Feature>, ProviderError> {
        let cache_key = CacheKeys::features(query);
        if let Some(cached) =
            cache::get_json::<Vec<Feature>>(self.cache.as_ref(), &cache_key)
                .await
        {
            debug!(query, "features cache hit");
            return Ok(cached);
        }

        let response = self
            .client
            .get(format!(
                "{}/features",
                self.settings.opensubtitles_base_url
            ))
            .query(&[("query", query)])
            .header("Api-Key", self.api_key()?)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: FeaturesResponse = response.json().await?;
        let features: Vec<Feature> = payload
            .data
            .into_iter()
            .filter_map(map_feature)
            .collect();

        info!(query, count = features.len(), "title search complete");
        cache::set_json(
            self.cache.as_ref(),
            &cache_key,
            &features,
            ttl::FEATURES,
        )
        .await;

        Ok(features)
    }

    /// List a season's episodes, derived from available subtitle metadata.
    pub async fn list_episodes(
        &self,
        tmdb_id: u64,
        season: u32,
    ) -> Result<Vec<EpisodeSummary>, ProviderError> {
        let cache_key = CacheKeys::episodes(tmdb_id, season);
        if let Some(cached) = cache::get_json::<Vec<EpisodeSummary>>(
            self.cache.as_ref(),
            &cache_key,
        )
        .await
        {
            debug!(tmdb_id, season, "episodes cache hit");
            return Ok(cached);
        }

        let response = self
            .client
            .get(format!(
                "{}/subtitles",
                self.settings.opensubtitles_base_url
            ))
            .query(&[
                ("parent_tmdb_id", tmdb_id.to_string()),
                ("season_number", season.to_string()),
                ("languages", "en".to_string()),
                ("order_by", "episode_number".to_string()),
            ])
            .header("Api-Key", self.api_key()?)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: SubtitlesResponse = response.json().await?;

        let mut episodes: Vec<EpisodeSummary> = Vec::new();
        for item in payload.data {
            let Some(details) = item.attributes.feature_details else {
                continue;
            };
            let Some(number) = details.episode_number else {
                continue;
            };
            match episodes.iter_mut().find(|e| e.number == number) {
                Some(existing) => existing.subtitle_count += 1,
                None => episodes.push(EpisodeSummary {
                    number,
                    title: details
                        .title
                        .unwrap_or_else(|| format!("Episode {number}")),
                    subtitle_count: 1,
                }),
            }
        }
        episodes.sort_by_key(|e| e.number);

        info!(
            tmdb_id,
            season,
            count = episodes.len(),
            "episode listing complete"
        );
        cache::set_json(
            self.cache.as_ref(),
            &cache_key,
            &episodes,
            ttl::EPISODES,
        )
        .await;

        Ok(episodes)
    }
}

fn map_feature(item: FeatureItem) -> Option<Feature> {
    let attrs = item.attributes;
    // Without a TMDB id the feature cannot be analyzed; skip it.
    let tmdb_id = attrs.tmdb_id.as_ref()?.as_u64()?;
    let title = attrs.title?;

    let content_type = match attrs.feature_type.as_deref() {
        Some("Tvshow") => ContentType::Episode,
        _ => ContentType::Movie,
    };
    let imdb_id = attrs
        .imdb_id
        .and_then(|id| id.as_u64())
        .map(|id| format!("tt{id:07}"));

    Some(Feature {
        id: match item.id {
            Numberish::Int(n) => n.to_string(),
            Numberish::Text(s) => s,
        },
        content_type,
        original_title: attrs.original_title.unwrap_or_else(|| title.clone()),
        title,
        year: attrs
            .year
            .and_then(|y| y.as_u64())
            .and_then(|y| u16::try_from(y).ok()),
        imdb_id,
        tmdb_id,
        poster_url: attrs.img_url,
        backdrop_url: None,
        overview: None,
        vote_average: None,
        genres: None,
        season_count: attrs
            .seasons_count
            .and_then(|c| c.as_u64())
            .and_then(|c| u32::try_from(c).ok()),
        season: None,
        episode: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imdb_ids_are_zero_padded() {
        let item = FeatureItem {
            id: Numberish::Int(1),
            attributes: FeatureAttributes {
                feature_type: Some("Movie".to_string()),
                title: Some("Heat".to_string()),
                original_title: None,
                year: Some(Numberish::Text("1995".to_string())),
                imdb_id: Some(Numberish::Int(113277)),
                tmdb_id: Some(Numberish::Int(949)),
                img_url: None,
                seasons_count: None,
            },
        };
        let feature = map_feature(item).unwrap();
        assert_eq!(feature.imdb_id.as_deref(), Some("tt0113277"));
        assert_eq!(feature.year, Some(1995));
        assert_eq!(feature.original_title, "Heat");
    }

    #[test]
    fn features_without_tmdb_id_are_skipped() {
        let item = FeatureItem {
            id: Numberish::Int(2),
            attributes: FeatureAttributes {
                feature_type: None,
                title: Some("Unlinked".to_string()),
                original_title: None,
                year: None,
                imdb_id: None,
                tmdb_id: None,
                img_url: None,
                seasons_count: None,
            },
        };
        assert!(map_feature(item).is_none());
    }
}
