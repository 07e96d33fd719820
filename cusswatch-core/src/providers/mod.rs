//! Subtitle provider adapters.
//!
//! Each adapter wraps one external subtitle source behind the uniform
//! [`SubtitleProvider`] contract. Provider-specific response shapes, auth
//! schemes and quirks stay entirely inside the adapter module; nothing
//! provider-shaped leaks into shared types.

mod gestdown;
mod opensubtitles;
mod registry;
mod subdl;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use cusswatch_model::{ContentType, SearchRequest};

pub use gestdown::GestdownProvider;
pub use opensubtitles::OpenSubtitlesProvider;
pub use registry::ProviderRegistry;
pub use subdl::SubDlProvider;

/// Errors a candidate download can fail with. Search-side failures never
/// escape an adapter; download failures are reported so the pipeline can
/// log them and move on to the next candidate.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The downloaded archive contained no subtitle-formatted entry.
    #[error("no subtitle file found in archive")]
    NoSubtitleInArchive,

    #[error("parse error: {0}")]
    Parse(String),
}

/// Deferred, idempotent download of one candidate's raw subtitle text.
#[async_trait]
pub trait SubtitleFetch: Send + Sync {
    async fn fetch(&self) -> Result<String, ProviderError>;
}

/// A lazy reference to a downloadable subtitle. Nothing has been fetched
/// yet; the download runs at most once per pipeline run and its result is
/// safe to cache.
#[derive(Clone)]
pub struct SubtitleCandidate {
    /// Provider-namespaced identifier, collision-free across sources.
    pub id: String,
    pub provider: &'static str,
    pub language: String,
    pub release: String,
    /// Provider-reported popularity; zero when the source has none.
    pub download_count: u64,
    pub hearing_impaired: bool,
    fetch: Arc<dyn SubtitleFetch>,
}

impl SubtitleCandidate {
    pub fn new(
        id: String,
        provider: &'static str,
        language: String,
        release: String,
        download_count: u64,
        hearing_impaired: bool,
        fetch: Arc<dyn SubtitleFetch>,
    ) -> Self {
        Self {
            id,
            provider,
            language,
            release,
            download_count,
            hearing_impaired,
            fetch,
        }
    }

    pub async fn download(&self) -> Result<String, ProviderError> {
        self.fetch.fetch().await
    }
}

impl fmt::Debug for SubtitleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtitleCandidate")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("language", &self.language)
            .field("release", &self.release)
            .field("download_count", &self.download_count)
            .field("hearing_impaired", &self.hearing_impaired)
            .finish_non_exhaustive()
    }
}

/// Uniform capability contract over heterogeneous subtitle sources.
///
/// `search` performs network I/O but must not fail on expected outage
/// modes (no results, auth failure, timeout): it logs and returns an empty
/// list so one provider's outage can never abort the fan-out.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pure predicate; no I/O.
    fn supports(&self, content_type: ContentType) -> bool;

    async fn search(&self, request: &SearchRequest) -> Vec<SubtitleCandidate>;
}
