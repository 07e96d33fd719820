use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Simple enum for the two analyzable content kinds.
///
/// Wire names stay `movie`/`tvshow` for compatibility with the public API
/// and with provider cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Feature film
    #[serde(rename = "movie")]
    Movie,
    /// A single episode of a series
    #[serde(rename = "tvshow")]
    Episode,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Episode => "tvshow",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a searchable title (movie or series).
///
/// Populated from the title-search endpoint and optionally enriched with
/// TMDB details before being embedded in an [`crate::AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub title: String,
    pub original_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub tmdb_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_count: Option<u32>,
    /// Set on the copy embedded in an episode analysis result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl Feature {
    /// Display label including the episode coordinates when present,
    /// e.g. `Breaking Bad S2E7`.
    pub fn display_label(&self) -> String {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) => {
                format!("{} S{season}E{episode}", self.title)
            }
            _ => self.title.clone(),
        }
    }
}

/// One episode row in a season listing, derived from subtitle metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub number: u32,
    pub title: String,
    pub subtitle_count: u32,
}
