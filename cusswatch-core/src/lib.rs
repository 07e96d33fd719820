//! # Cusswatch Core
//!
//! Subtitle acquisition and profanity analysis pipeline.
//!
//! The core drives one request through five stages: provider fan-out
//! (searching every applicable subtitle source concurrently), round-robin
//! candidate interleaving, sequential download attempts with a length-based
//! acceptance gate, classification of the surviving transcript, and
//! category/rating assembly. External collaborators (cache store,
//! classification service) are injected behind traits so the pipeline can
//! be exercised entirely in-memory.

pub mod cache;
pub mod catalog;
pub mod classify;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod providers;
pub mod settings;
pub mod subtitles;

pub use cache::{Cache, CacheKeys, MemoryCache, RedisCache};
pub use catalog::CatalogClient;
pub use classify::{Classification, Classifier, ClassifyError, GeminiClassifier};
pub use error::{AnalysisError, Result};
pub use metadata::TmdbClient;
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, ProgressSink};
pub use providers::{
    GestdownProvider, OpenSubtitlesProvider, ProviderError, ProviderRegistry,
    SubDlProvider, SubtitleCandidate, SubtitleFetch, SubtitleProvider,
};
pub use settings::{
    ClassifierSettings, PipelineSettings, ProviderSettings, TmdbSettings,
};
pub use subtitles::parse_srt;
