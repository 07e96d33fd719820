use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::Feature;
use crate::profanity::{ProfanityCategory, RatingLabel};

/// Final aggregate produced by one successful pipeline run.
///
/// Constructed once, cached whole under
/// `analysis:{tmdb}:{type}:s{season}e{episode}`, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub feature: Feature,
    pub categories: Vec<ProfanityCategory>,
    pub total_profanities: u32,
    pub rating: RatingLabel,
    pub rating_score: u32,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
    /// How many subtitle candidates were attempted before one was accepted.
    pub subtitles_attempted: u32,
}

impl AnalysisResult {
    pub fn total_from(categories: &[ProfanityCategory]) -> u32 {
        categories.iter().map(|c| c.total_count).sum()
    }
}
