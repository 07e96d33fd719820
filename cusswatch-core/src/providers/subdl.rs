//! SubDL adapter.
//!
//! Keyed REST search; downloads arrive as zip archives, so the fetch step
//! extracts the first `.srt` entry. SubDL reports no download counts, so
//! every candidate ranks at zero popularity.

use std::io::{Cursor, Read};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use cusswatch_model::{ContentType, SearchRequest};

use crate::cache::{Cache, CacheKeys, ttl};
use crate::settings::ProviderSettings;

use super::{ProviderError, SubtitleCandidate, SubtitleFetch, SubtitleProvider};

const PROVIDER_NAME: &str = "subdl";

pub struct SubDlProvider {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
}

impl std::fmt::Debug for SubDlProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubDlProvider").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    subtitles: Vec<SubDlSubtitle>,
}

#[derive(Debug, Deserialize)]
struct SubDlSubtitle {
    #[serde(default)]
    release_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    hi: Option<bool>,
}

impl SubDlProvider {
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
    ) -> Result<Vec<SubtitleCandidate>, ProviderError> {
        let api_key = self.settings.subdl_api_key.as_deref().ok_or_else(|| {
            ProviderError::Api("SubDL API key not configured".into())
        })?;

        let mut params: Vec<(&str, String)> = vec![
            ("api_key", api_key.to_string()),
            ("tmdb_id", request.tmdb_id.to_string()),
            ("languages", request.language.to_uppercase()),
            ("subs_per_page", "30".to_string()),
            (
                "type",
                match request.content_type {
                    ContentType::Movie => "movie".to_string(),
                    ContentType::Episode => "tv".to_string(),
                },
            ),
        ];
        if request.content_type == ContentType::Episode {
            if let Some(season) = request.season {
                params.push(("season_number", season.to_string()));
                if let Some(episode) = request.episode {
                    params.push(("episode_number", episode.to_string()));
                }
            }
        }

        let response = self
            .client
            .get(format!("{}/subtitles", self.settings.subdl_api_base_url))
            .query(&params)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: SearchResponse = response.json().await?;
        if !payload.status {
            debug!("SubDL reported no subtitles for this request");
            return Ok(Vec::new());
        }

        info!(count = payload.subtitles.len(), "SubDL search complete");

        let candidates = payload
            .subtitles
            .into_iter()
            .enumerate()
            .filter_map(|(index, subtitle)| {
                let url_path = subtitle.url?;
                let release = subtitle
                    .release_name
                    .or(subtitle.name)
                    .unwrap_or_else(|| "unknown".to_string());
                let fetch = Arc::new(SubDlFetch {
                    client: self.client.clone(),
                    cache: Arc::clone(&self.cache),
                    settings: Arc::clone(&self.settings),
                    url_path: url_path.clone(),
                });
                Some(SubtitleCandidate::new(
                    format!("subdl-{index}-{url_path}"),
                    PROVIDER_NAME,
                    subtitle
                        .language
                        .map(|l| l.to_lowercase())
                        .unwrap_or_else(|| request.language.clone()),
                    release,
                    // SubDL does not expose download counts.
                    0,
                    subtitle.hi.unwrap_or(false),
                    fetch,
                ))
            })
            .collect();

        Ok(candidates)
    }
}

#[async_trait]
impl SubtitleProvider for SubDlProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, _content_type: ContentType) -> bool {
        true
    }

    async fn search(&self, request: &SearchRequest) -> Vec<SubtitleCandidate> {
        match self.search_inner(request).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(provider = PROVIDER_NAME, %err, "search failed");
                Vec::new()
            }
        }
    }
}

struct SubDlFetch {
    client: reqwest::Client,
    cache: Arc<dyn Cache>,
    settings: Arc<ProviderSettings>,
    url_path: String,
}

#[async_trait]
impl SubtitleFetch for SubDlFetch {
    async fn fetch(&self) -> Result<String, ProviderError> {
        let cache_key = CacheKeys::subdl_content(&self.url_path);
        if let Some(content) = self.cache.get(&cache_key).await {
            debug!(url = %self.url_path, "subtitle content cache hit");
            return Ok(content);
        }

        let url = format!(
            "{}{}",
            self.settings.subdl_download_base_url, self.url_path
        );
        let response = self
            .client
            .get(&url)
            // Archive transfers get the longer allowance.
            .timeout(self.settings.archive_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let content = extract_first_srt(&bytes)?;

        info!(
            url = %self.url_path,
            chars = content.len(),
            "extracted subtitle from archive"
        );
        self.cache
            .set(&cache_key, content.clone(), ttl::SUBTITLE_CONTENT)
            .await;

        Ok(content)
    }
}

/// Locate and read the first `.srt` entry of a zip archive.
fn extract_first_srt(bytes: &[u8]) -> Result<String, ProviderError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !entry.name().to_lowercase().ends_with(".srt") {
            continue;
        }

        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|err| ProviderError::Parse(err.to_string()))?;
        return Ok(String::from_utf8_lossy(&raw).into_owned());
    }

    Err(ProviderError::NoSubtitleInArchive)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer =
            zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_first_srt_entry() {
        let bytes = zip_with(&[
            ("readme.txt", "not subtitles"),
            ("Movie.2024.srt", "1\n00:00:01,000 --> 00:00:02,000\nHi\n"),
            ("other.srt", "ignored"),
        ]);
        let content = extract_first_srt(&bytes).unwrap();
        assert!(content.contains("Hi"));
    }

    #[test]
    fn srt_match_is_case_insensitive() {
        let bytes = zip_with(&[("UPPER.SRT", "dialogue")]);
        assert_eq!(extract_first_srt(&bytes).unwrap(), "dialogue");
    }

    #[test]
    fn archive_without_subtitles_is_a_distinct_error() {
        let bytes = zip_with(&[("notes.txt", "nope")]);
        assert!(matches!(
            extract_first_srt(&bytes),
            Err(ProviderError::NoSubtitleInArchive)
        ));
    }

    #[test]
    fn garbage_bytes_fail_as_archive_error() {
        assert!(matches!(
            extract_first_srt(b"not a zip"),
            Err(ProviderError::Archive(_))
        ));
    }
}
