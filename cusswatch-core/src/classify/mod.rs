//! Profanity classification.
//!
//! The classification model is an external collaborator consumed through
//! the [`Classifier`] trait: plain transcript text in, a flat word list
//! plus a free-text summary out. Everything deterministic (chunk merging,
//! category folding, rating math) lives on this side of the boundary.

mod categorize;
mod gemini;
mod rating;

use async_trait::async_trait;

use cusswatch_model::ProfanityWord;

pub use categorize::categorize;
pub use gemini::GeminiClassifier;
pub use rating::rate;

/// Flat classification output before category folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub words: Vec<ProfanityWord>,
    pub summary: String,
}

/// Failures of the classification call. Unlike provider errors these are
/// terminal for the pipeline; there is no fallback classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classification service not configured: {0}")]
    NotConfigured(String),

    #[error("classification request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("classification service returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("classification service returned an empty response")]
    EmptyResponse,
}

/// External text-classification service contract.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a full transcript. Implementations handle any
    /// provider-side size limits internally (chunking, merging).
    async fn classify(
        &self,
        transcript: &str,
        title: &str,
    ) -> Result<Classification, ClassifyError>;
}
