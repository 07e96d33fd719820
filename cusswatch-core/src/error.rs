use thiserror::Error;

use crate::classify::ClassifyError;

/// Terminal pipeline errors, one variant per user-visible failure class.
///
/// Individual provider failures never surface here; they are absorbed at
/// the adapter boundary and only manifest indirectly as `NoSubtitlesFound`
/// or `NoUsableSubtitles` when every source came up empty.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No provider returned any candidate (supply-side emptiness).
    #[error("no subtitles found for this title")]
    NoSubtitlesFound,

    /// Candidates existed but none passed the acceptance gate within the
    /// attempt cap (quality-side rejection).
    #[error("could not download usable subtitles after {attempts} attempts")]
    NoUsableSubtitles { attempts: u32 },

    #[error("profanity analysis failed: {0}")]
    Classification(#[from] ClassifyError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
