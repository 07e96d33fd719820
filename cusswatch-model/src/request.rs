use serde::{Deserialize, Serialize};

use crate::media::{ContentType, Feature};

/// Immutable input value handed to every subtitle provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub tmdb_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub content_type: ContentType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl SearchRequest {
    /// Build a request from feature metadata. Language defaults to English;
    /// the design currently analyzes a single fixed language.
    pub fn from_feature(
        feature: &Feature,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Self {
        Self {
            tmdb_id: feature.tmdb_id,
            imdb_id: feature.imdb_id.clone(),
            content_type: feature.content_type,
            title: feature.title.clone(),
            year: feature.year,
            language: "en".to_string(),
            season,
            episode,
        }
    }
}
