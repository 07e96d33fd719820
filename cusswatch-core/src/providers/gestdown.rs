//! Gestdown (Addic7ed proxy) adapter. Series episodes only.
//!
//! Search is two-step: resolve the show id by title (cached, shows rarely
//! move), then list that episode's subtitles, keeping only completed
//! uploads. Downloads are plain text, no auth.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use cusswatch_model::{ContentType, SearchRequest};

use crate::cache::{Cache, CacheKeys, ttl};
use crate::settings::ProviderSettings;

use super::{ProviderError, SubtitleCandidate, SubtitleFetch, SubtitleProvider};

const PROVIDER_NAME: &str = "gestdown";

/// Addic7ed indexes subtitles by full language name, not ISO code.
fn addic7ed_language(code: &str) -> &str {
    match code {
        "en" => "english",
        "fr" => "french",
        "es" => "spanish",
        "de" => "german",
        "it" => "italian",
        "pt" => "portuguese",
        "nl" => "dutch",
        "pl" => "polish",
        "sv" => "swedish",
        "no" => "norwegian",
        "da" => "danish",
        "fi" => "finnish",
        other => other,
    }
}

pub struct GestdownProvider {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
}

impl std::fmt::Debug for GestdownProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestdownProvider").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ShowSearchResponse {
    #[serde(default)]
    shows: Vec<Show>,
}

#[derive(Debug, Deserialize)]
struct Show {
    #[serde(rename = "uniqueId")]
    unique_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SubtitleListResponse {
    #[serde(default, rename = "matchingSubtitles")]
    matching_subtitles: Vec<GestdownSubtitle>,
    #[serde(default)]
    subtitles: Vec<GestdownSubtitle>,
}

#[derive(Debug, Deserialize)]
struct GestdownSubtitle {
    #[serde(rename = "subtitleId")]
    subtitle_id: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default, rename = "hearingImpaired")]
    hearing_impaired: bool,
    #[serde(default, rename = "downloadCount")]
    download_count: u64,
}

impl GestdownProvider {
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

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.settings.gestdown_base_url)
            .map_err(|err| ProviderError::Parse(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Parse("gestdown base URL cannot be a base".into())
            })?
            .extend(segments);
        Ok(url)
    }

    /// Resolve a show's Addic7ed id by title, first match wins.
    async fn find_show(&self, title: &str) -> Result<Option<String>, ProviderError> {
        let cache_key = CacheKeys::gestdown_show(title);
        if let Some(show_id) = self.cache.get(&cache_key).await {
            debug!(title, "show lookup cache hit");
            return Ok(Some(show_id));
        }

        let url = self.endpoint(&["shows", "search", title])?;
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        // Unknown shows come back as 404; that is a miss, not a failure.
        if !response.status().is_success() {
            debug!(title, status = %response.status(), "show not found");
            return Ok(None);
        }

        let payload: ShowSearchResponse = response.json().await?;
        let Some(show) = payload.shows.into_iter().next() else {
            return Ok(None);
        };

        info!(title, show = %show.name, id = %show.unique_id, "resolved show");
        self.cache
            .set(&cache_key, show.unique_id.clone(), ttl::SHOW_LOOKUP)
            .await;

        Ok(Some(show.unique_id))
    }

    async fn search_inner(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SubtitleCandidate>, ProviderError> {
        let (Some(season), Some(episode)) = (request.season, request.episode)
        else {
            return Ok(Vec::new());
        };

        let Some(show_id) = self.find_show(&request.title).await? else {
            warn!(title = %request.title, "show not found on Addic7ed");
            return Ok(Vec::new());
        };

        let url = self.endpoint(&[
            "subtitles",
            "get",
            &show_id,
            &season.to_string(),
            &episode.to_string(),
            addic7ed_language(&request.language),
        ])?;
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: SubtitleListResponse = response.json().await?;
        let subtitles = if payload.matching_subtitles.is_empty() {
            payload.subtitles
        } else {
            payload.matching_subtitles
        };

        info!(count = subtitles.len(), "Gestdown search complete");

        let candidates = subtitles
            .into_iter()
            .filter(|subtitle| subtitle.completed)
            .map(|subtitle| {
                let fetch = Arc::new(GestdownFetch {
                    client: self.client.clone(),
                    cache: Arc::clone(&self.cache),
                    settings: Arc::clone(&self.settings),
                    subtitle_id: subtitle.subtitle_id.clone(),
                });
                SubtitleCandidate::new(
                    format!("gestdown-{}", subtitle.subtitle_id),
                    PROVIDER_NAME,
                    request.language.clone(),
                    subtitle
                        .version
                        .unwrap_or_else(|| "unknown".to_string()),
                    subtitle.download_count,
                    subtitle.hearing_impaired,
                    fetch,
                )
            })
            .collect();

        Ok(candidates)
    }
}

#[async_trait]
impl SubtitleProvider for GestdownProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Episode
    }

    async fn search(&self, request: &SearchRequest) -> Vec<SubtitleCandidate> {
        if request.content_type != ContentType::Episode {
            return Vec::new();
        }
        match self.search_inner(request).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(provider = PROVIDER_NAME, %err, "search failed");
                Vec::new()
            }
        }
    }
}

struct GestdownFetch {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
    subtitle_id: String,
}

#[async_trait]
impl SubtitleFetch for GestdownFetch {
    async fn fetch(&self) -> Result<String, ProviderError> {
        let cache_key = CacheKeys::gestdown_content(&self.subtitle_id);
        if let Some(content) = self.cache.get(&cache_key).await {
            debug!(subtitle_id = %self.subtitle_id, "subtitle content cache hit");
            return Ok(content);
        }

        let url = format!(
            "{}/subtitles/download/{}",
            self.settings.gestdown_base_url, self.subtitle_id
        );
        let response = self
            .client
            .get(&url)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }
        let content = response.text().await?;

        info!(
            subtitle_id = %self.subtitle_id,
            chars = content.len(),
            "downloaded subtitle"
        );
        self.cache
            .set(&cache_key, content.clone(), ttl::SUBTITLE_CONTENT)
            .await;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_map_to_addic7ed_names() {
        assert_eq!(addic7ed_language("en"), "english");
        assert_eq!(addic7ed_language("fi"), "finnish");
        // Unmapped codes pass through untouched.
        assert_eq!(addic7ed_language("tlh"), "tlh");
    }
}
