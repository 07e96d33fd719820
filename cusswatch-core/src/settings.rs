//! Tunable settings for the core components.
//!
//! Every struct deserializes with serde defaults so a bare environment
//! yields a working (if keyless) configuration; the server crate layers
//! `CUSSWATCH_`-prefixed environment values on top.

use std::time::Duration;

use serde::Deserialize;

/// Credentials, base URLs and timeouts for the subtitle providers.
///
/// Base URLs are overridable so integration tests can point adapters at a
/// local stub server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub opensubtitles_api_key: Option<String>,
    pub opensubtitles_username: Option<String>,
    pub opensubtitles_password: Option<String>,
    pub subdl_api_key: Option<String>,

    pub opensubtitles_base_url: String,
    pub subdl_api_base_url: String,
    pub subdl_download_base_url: String,
    pub gestdown_base_url: String,

    /// Hard timeout for search/login/download-link requests.
    pub request_timeout_secs: u64,
    /// Longer allowance for archive transfers.
    pub archive_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            opensubtitles_api_key: None,
            opensubtitles_username: None,
            opensubtitles_password: None,
            subdl_api_key: None,
            opensubtitles_base_url: "https://api.opensubtitles.com/api/v1"
                .to_string(),
            subdl_api_base_url: "https://api.subdl.com/api/v1".to_string(),
            subdl_download_base_url: "https://dl.subdl.com".to_string(),
            gestdown_base_url: "https://api.gestdown.info".to_string(),
            request_timeout_secs: 10,
            archive_timeout_secs: 15,
        }
    }
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive_timeout_secs)
    }
}

/// Attempt cap and acceptance gates for the download loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// At most this many candidates are tried per run; bounds latency and
    /// protects provider download quotas.
    pub attempt_cap: usize,
    /// Per-candidate acceptance gate on parsed transcript length.
    pub candidate_min_chars: usize,
    /// Looser whole-pipeline gate re-checked just before classification.
    pub transcript_min_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            attempt_cap: 5,
            candidate_min_chars: 100,
            transcript_min_chars: 50,
        }
    }
}

/// TMDB metadata enrichment. Entirely optional; a missing key disables
/// enrichment without affecting analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TmdbSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl TmdbSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Classification service endpoint and chunking limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub model: String,
    /// Transcripts longer than this are split on whitespace boundaries and
    /// classified chunk by chunk.
    pub chunk_chars: usize,
    pub request_timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url:
                "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            chunk_chars: 50_000,
            request_timeout_secs: 60,
        }
    }
}

impl ClassifierSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
