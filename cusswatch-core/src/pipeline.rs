//! Transcript acquisition and analysis pipeline.
//!
//! One logical run per request: SEARCHING -> DOWNLOADING -> PARSING ->
//! CLASSIFYING -> CATEGORIZING -> COMPLETE, with a terminal error
//! reachable from every stage. Provider fan-out is concurrent; the
//! download-attempt loop is deliberately sequential because only one
//! transcript is needed and speculative parallel downloads would burn
//! provider download quotas.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use cusswatch_model::{
    AnalysisResult, ContentType, Feature, ProgressEvent, SearchRequest,
};

use crate::cache::{self, Cache, CacheKeys, ttl};
use crate::classify::{Classifier, categorize, rate};
use crate::error::{AnalysisError, Result};
use crate::providers::ProviderRegistry;
use crate::settings::PipelineSettings;
use crate::subtitles::parse_srt;

/// Progress side-channel. Emission is fire-and-forget: a consumer that
/// stopped listening drops events silently and never affects the run.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn attached(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub async fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).await.is_err() {
                debug!("progress receiver dropped, discarding event");
            }
        }
    }
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// True when an unexpired cache entry short-circuited the run.
    pub from_cache: bool,
}

pub struct AnalysisPipeline {
    registry: Arc<ProviderRegistry>,
    classifier: Arc<dyn Classifier>,
    cache: Arc<dyn Cache>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AnalysisPipeline {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        classifier: Arc<dyn Classifier>,
        cache: Arc<dyn Cache>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            classifier,
            cache,
            settings,
        }
    }

    /// Look up an unexpired cached result without running anything.
    pub async fn cached(
        &self,
        feature: &Feature,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Option<AnalysisResult> {
        let key = CacheKeys::analysis(
            feature.tmdb_id,
            feature.content_type,
            season,
            episode,
        );
        cache::get_json(self.cache.as_ref(), &key).await
    }

    /// Run the full pipeline. Every terminal outcome, success or error, is
    /// also mirrored onto the progress sink.
    pub async fn run(
        &self,
        feature: Feature,
        season: Option<u32>,
        episode: Option<u32>,
        progress: &ProgressSink,
    ) -> Result<AnalysisOutcome> {
        match self.execute(feature, season, episode, progress).await {
            Ok(outcome) => {
                progress
                    .emit(ProgressEvent::Complete {
                        result: Box::new(outcome.result.clone()),
                    })
                    .await;
                Ok(outcome)
            }
            Err(err) => {
                progress
                    .emit(ProgressEvent::Error {
                        error: err.to_string(),
                    })
                    .await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        feature: Feature,
        season: Option<u32>,
        episode: Option<u32>,
        progress: &ProgressSink,
    ) -> Result<AnalysisOutcome> {
        validate(&feature, season, episode)?;

        let cache_key = CacheKeys::analysis(
            feature.tmdb_id,
            feature.content_type,
            season,
            episode,
        );
        if let Some(result) =
            cache::get_json::<AnalysisResult>(self.cache.as_ref(), &cache_key)
                .await
        {
            info!(key = %cache_key, "analysis cache hit, short-circuiting");
            return Ok(AnalysisOutcome {
                result,
                from_cache: true,
            });
        }

        // SEARCHING
        progress
            .emit(ProgressEvent::Searching {
                message: "Searching for subtitles across multiple sources"
                    .to_string(),
            })
            .await;

        let request = SearchRequest::from_feature(&feature, season, episode);
        let candidates = self.registry.search_all(&request).await;
        if candidates.is_empty() {
            warn!("no subtitles found from any provider");
            return Err(AnalysisError::NoSubtitlesFound);
        }

        // DOWNLOADING / PARSING retry loop
        progress
            .emit(ProgressEvent::Downloading {
                message: "Downloading subtitle file".to_string(),
            })
            .await;

        let max_attempts = candidates.len().min(self.settings.attempt_cap);
        let mut transcript: Option<String> = None;
        let mut attempts: u32 = 0;

        for candidate in candidates.iter().take(max_attempts) {
            attempts += 1;
            info!(
                attempt = attempts,
                max_attempts,
                provider = candidate.provider,
                id = %candidate.id,
                release = %candidate.release,
                download_count = candidate.download_count,
                "trying candidate"
            );

            let raw = match candidate.download().await {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(
                        attempt = attempts,
                        provider = candidate.provider,
                        %err,
                        "download failed, trying next candidate"
                    );
                    continue;
                }
            };

            progress
                .emit(ProgressEvent::Parsing {
                    message: "Parsing subtitle content".to_string(),
                })
                .await;

            let parsed = parse_srt(&raw);
            let parsed_chars = parsed.chars().count();
            if parsed_chars >= self.settings.candidate_min_chars {
                info!(
                    attempt = attempts,
                    provider = candidate.provider,
                    chars = parsed_chars,
                    "candidate accepted"
                );
                transcript = Some(parsed);
                break;
            }
            warn!(
                attempt = attempts,
                chars = parsed_chars,
                "transcript too short, trying next candidate"
            );
        }

        // Safety-net gate, deliberately looser than the per-candidate one.
        let transcript = transcript.filter(|t| {
            t.chars().count() >= self.settings.transcript_min_chars
        });
        let Some(transcript) = transcript else {
            warn!(attempts, "no usable subtitle content");
            return Err(AnalysisError::NoUsableSubtitles { attempts });
        };

        // CLASSIFYING
        progress
            .emit(ProgressEvent::Classifying {
                message: "Analyzing transcript for profanity".to_string(),
            })
            .await;

        let title_label = match (season, episode) {
            (Some(s), Some(e)) => format!("{} S{s}E{e}", feature.title),
            _ => feature.title.clone(),
        };
        let classification =
            self.classifier.classify(&transcript, &title_label).await?;

        // CATEGORIZING
        progress
            .emit(ProgressEvent::Categorizing {
                message: "Categorizing results".to_string(),
            })
            .await;

        let categories = categorize(classification.words);
        let (rating, rating_score) = rate(&categories);

        let mut analyzed_feature = feature;
        if season.is_some() {
            analyzed_feature.season = season;
        }
        if episode.is_some() {
            analyzed_feature.episode = episode;
        }

        let result = AnalysisResult {
            total_profanities: AnalysisResult::total_from(&categories),
            feature: analyzed_feature,
            categories,
            rating,
            rating_score,
            summary: classification.summary,
            analyzed_at: Utc::now(),
            subtitles_attempted: attempts,
        };

        info!(
            total = result.total_profanities,
            categories = result.categories.len(),
            rating = %result.rating,
            score = result.rating_score,
            attempts,
            "analysis complete"
        );

        cache::set_json(self.cache.as_ref(), &cache_key, &result, ttl::ANALYSIS)
            .await;

        Ok(AnalysisOutcome {
            result,
            from_cache: false,
        })
    }
}

fn validate(
    feature: &Feature,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<()> {
    if feature.tmdb_id == 0 {
        return Err(AnalysisError::InvalidRequest(
            "feature with tmdb_id is required".to_string(),
        ));
    }
    if feature.title.trim().is_empty() {
        return Err(AnalysisError::InvalidRequest(
            "feature title is required".to_string(),
        ));
    }
    if feature.content_type == ContentType::Episode
        && (season.is_none() || episode.is_none())
    {
        return Err(AnalysisError::InvalidRequest(
            "season and episode are required for series analysis".to_string(),
        ));
    }
    Ok(())
}
