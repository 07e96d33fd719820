//! OpenSubtitles REST adapter.
//!
//! Search is a single keyed REST call ordered by download count. Download
//! is a three-step flow: lazy session login (performed at download time,
//! never at search time), a download-link request, then the file fetch. A
//! failed login degrades to an unauthenticated download attempt.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cusswatch_model::{ContentType, SearchRequest};

use crate::cache::{self, Cache, CacheKeys, ttl};
use crate::settings::ProviderSettings;

use super::{ProviderError, SubtitleCandidate, SubtitleFetch, SubtitleProvider};

const PROVIDER_NAME: &str = "opensubtitles";
const USER_AGENT: &str = "Cusswatch v1.0";

pub struct OpenSubtitlesProvider {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
}

impl std::fmt::Debug for OpenSubtitlesProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSubtitlesProvider").finish_non_exhaustive()
    }
}

/// Serializable subset of a search hit, cached between requests and used
/// to rebuild candidates without re-querying the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSubtitle {
    file_id: i64,
    language: String,
    release: String,
    download_count: u64,
    hearing_impaired: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    attributes: SubtitleAttributes,
}

#[derive(Debug, Deserialize)]
struct SubtitleAttributes {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    download_count: Option<u64>,
    #[serde(default)]
    hearing_impaired: Option<bool>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    files: Vec<SubtitleFile>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFile {
    file_id: i64,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct DownloadLinkResponse {
    link: String,
}

impl OpenSubtitlesProvider {
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

    async fn search_inner(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<CachedSubtitle>, ProviderError> {
        let cache_key = CacheKeys::os_search(
            request.tmdb_id,
            request.content_type,
            &request.language,
            request.season,
            request.episode,
        );
        if let Some(cached) =
            cache::get_json::<Vec<CachedSubtitle>>(self.cache.as_ref(), &cache_key)
                .await
        {
            debug!(key = %cache_key, "using cached search results");
            return Ok(cached);
        }

        let api_key = self
            .settings
            .opensubtitles_api_key
            .as_deref()
            .ok_or_else(|| {
                ProviderError::Api("OpenSubtitles API key not configured".into())
            })?;

        let tmdb = request.tmdb_id.to_string();
        let mut params: Vec<(&str, String)> = vec![
            ("languages", request.language.clone()),
            ("order_by", "download_count".to_string()),
        ];
        match request.content_type {
            ContentType::Movie => {
                params.push(("tmdb_id", tmdb));
                params.push(("type", "movie".to_string()));
            }
            ContentType::Episode => {
                params.push(("parent_tmdb_id", tmdb));
                params.push(("type", "episode".to_string()));
                if let Some(season) = request.season {
                    params.push(("season_number", season.to_string()));
                }
                if let Some(episode) = request.episode {
                    params.push(("episode_number", episode.to_string()));
                }
            }
        }

        let response = self
            .client
            .get(format!("{}/subtitles", self.settings.opensubtitles_base_url))
            .query(&params)
            .header("Api-Key", api_key)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: SearchResponse = response.json().await?;
        let subtitles: Vec<CachedSubtitle> = payload
            .data
            .into_iter()
            .filter_map(|item| {
                let attrs = item.attributes;
                let file = attrs.files.first()?;
                Some(CachedSubtitle {
                    file_id: file.file_id,
                    language: attrs
                        .language
                        .unwrap_or_else(|| request.language.clone()),
                    release: attrs
                        .release
                        .or_else(|| file.file_name.clone())
                        .unwrap_or_else(|| "unknown".to_string()),
                    download_count: attrs.download_count.unwrap_or(0),
                    hearing_impaired: attrs.hearing_impaired.unwrap_or(false),
                })
            })
            .collect();

        info!(count = subtitles.len(), "OpenSubtitles search complete");
        cache::set_json(
            self.cache.as_ref(),
            &cache_key,
            &subtitles,
            ttl::SUBTITLE_SEARCH,
        )
        .await;

        Ok(subtitles)
    }

    fn candidate_from(&self, subtitle: CachedSubtitle) -> SubtitleCandidate {
        let fetch = Arc::new(OpenSubtitlesFetch {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
            settings: Arc::clone(&self.settings),
            file_id: subtitle.file_id,
        });
        SubtitleCandidate::new(
            format!("os-{}", subtitle.file_id),
            PROVIDER_NAME,
            subtitle.language,
            subtitle.release,
            subtitle.download_count,
            subtitle.hearing_impaired,
            fetch,
        )
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, _content_type: ContentType) -> bool {
        true
    }

    async fn search(&self, request: &SearchRequest) -> Vec<SubtitleCandidate> {
        match self.search_inner(request).await {
            Ok(subtitles) => subtitles
                .into_iter()
                .map(|s| self.candidate_from(s))
                .collect(),
            Err(err) => {
                warn!(provider = PROVIDER_NAME, %err, "search failed");
                Vec::new()
            }
        }
    }
}

struct OpenSubtitlesFetch {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
    file_id: i64,
}

impl OpenSubtitlesFetch {
    /// Session login, attempted lazily right before the download-link
    /// request. Any failure degrades to an unauthenticated attempt.
    async fn try_login(&self, api_key: &str) -> Option<String> {
        let username = self.settings.opensubtitles_username.clone()?;
        let password = self.settings.opensubtitles_password.clone()?;

        let response = self
            .client
            .post(format!("{}/login", self.settings.opensubtitles_base_url))
            .header("Api-Key", api_key)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .timeout(self.settings.request_timeout())
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                match res.json::<LoginResponse>().await {
                    Ok(login) => Some(login.token),
                    Err(err) => {
                        warn!(%err, "login response unreadable, continuing unauthenticated");
                        None
                    }
                }
            }
            Ok(res) => {
                warn!(status = %res.status(), "login rejected, continuing unauthenticated");
                None
            }
            Err(err) => {
                warn!(%err, "login failed, continuing unauthenticated");
                None
            }
        }
    }
}

#[async_trait]
impl SubtitleFetch for OpenSubtitlesFetch {
    async fn fetch(&self) -> Result<String, ProviderError> {
        let cache_key = CacheKeys::os_content(self.file_id);
        if let Some(content) = self.cache.get(&cache_key).await {
            debug!(file_id = self.file_id, "subtitle content cache hit");
            return Ok(content);
        }

        let api_key = self
            .settings
            .opensubtitles_api_key
            .as_deref()
            .ok_or_else(|| {
                ProviderError::Api("OpenSubtitles API key not configured".into())
            })?;

        let token = self.try_login(api_key).await;

        let mut link_request = self
            .client
            .post(format!("{}/download", self.settings.opensubtitles_base_url))
            .header("Api-Key", api_key)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({
                "file_id": self.file_id,
                "sub_format": "srt",
            }))
            .timeout(self.settings.request_timeout());
        if let Some(token) = token {
            link_request = link_request.bearer_auth(token);
        }

        let link_response = link_request.send().await?;
        if !link_response.status().is_success() {
            return Err(ProviderError::Status(link_response.status()));
        }
        let link: DownloadLinkResponse = link_response.json().await?;

        let file_response = self
            .client
            .get(&link.link)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;
        if !file_response.status().is_success() {
            return Err(ProviderError::Status(file_response.status()));
        }
        let content = file_response.text().await?;

        info!(
            file_id = self.file_id,
            chars = content.len(),
            "downloaded subtitle"
        );
        self.cache
            .set(&cache_key, content.clone(), ttl::SUBTITLE_CONTENT)
            .await;

        Ok(content)
    }
}
