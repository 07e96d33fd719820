use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Severity class assigned to a word or a whole category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Strong,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Strong => "strong",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One distinct word reported by the classification service, with its
/// aggregate occurrence count across the whole transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfanityWord {
    pub word: String,
    pub count: u32,
    pub category: String,
    pub severity: Severity,
}

/// Words grouped under one category name, ordered by descending count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfanityCategory {
    pub name: String,
    pub words: Vec<ProfanityWord>,
    pub total_count: u32,
    pub severity: Severity,
}

/// Overall rating label derived from the weighted severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingLabel {
    Clean,
    Mild,
    Moderate,
    Heavy,
    Extreme,
}

impl RatingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingLabel::Clean => "Clean",
            RatingLabel::Mild => "Mild",
            RatingLabel::Moderate => "Moderate",
            RatingLabel::Heavy => "Heavy",
            RatingLabel::Extreme => "Extreme",
        }
    }
}

impl Display for RatingLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
