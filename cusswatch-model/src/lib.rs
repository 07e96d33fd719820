//! Core data model definitions shared across Cusswatch crates.

pub mod analysis;
pub mod media;
pub mod profanity;
pub mod progress;
pub mod request;

pub use analysis::AnalysisResult;
pub use media::{ContentType, EpisodeSummary, Feature};
pub use profanity::{ProfanityCategory, ProfanityWord, RatingLabel, Severity};
pub use progress::ProgressEvent;
pub use request::SearchRequest;
