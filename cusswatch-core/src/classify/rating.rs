//! Severity/volume rating blend.

use cusswatch_model::{ProfanityCategory, RatingLabel, Severity};

/// Compute the overall rating label and 0-100 score.
///
/// Weighted raw score:
/// `(strong*3 + moderate*2 + mild) / max(total,1) * min(total,100)`,
/// clamped to [0,100] and rounded. The proportion term rewards severity
/// mix, the volume term (capped at 100 occurrences) keeps a single strong
/// word in an otherwise clean work from dominating while still letting
/// sheer volume escalate the rating.
pub fn rate(categories: &[ProfanityCategory]) -> (RatingLabel, u32) {
    let total: u32 = categories.iter().map(|c| c.total_count).sum();
    if total == 0 {
        return (RatingLabel::Clean, 0);
    }

    let sum_for = |severity: Severity| -> u32 {
        categories
            .iter()
            .filter(|c| c.severity == severity)
            .map(|c| c.total_count)
            .sum()
    };
    let strong = sum_for(Severity::Strong);
    let moderate = sum_for(Severity::Moderate);
    let mild = total - strong - moderate;

    let weighted = f64::from(strong * 3 + moderate * 2 + mild)
        / f64::from(total.max(1))
        * f64::from(total.min(100));
    let score = weighted.round().clamp(0.0, 100.0) as u32;

    let label = match score {
        0..=15 => RatingLabel::Mild,
        16..=40 => RatingLabel::Moderate,
        41..=70 => RatingLabel::Heavy,
        _ => RatingLabel::Extreme,
    };
    (label, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(severity: Severity, total_count: u32) -> ProfanityCategory {
        ProfanityCategory {
            name: format!("{severity}-group"),
            words: Vec::new(),
            total_count,
            severity,
        }
    }

    #[test]
    fn no_profanity_is_clean_zero() {
        assert_eq!(rate(&[]), (RatingLabel::Clean, 0));
        assert_eq!(
            rate(&[category(Severity::Strong, 0)]),
            (RatingLabel::Clean, 0)
        );
    }

    #[test]
    fn few_mild_words_rate_mild() {
        // 5 mild occurrences: 5/5 * 5 = 5.
        let (label, score) = rate(&[category(Severity::Mild, 5)]);
        assert_eq!(score, 5);
        assert_eq!(label, RatingLabel::Mild);
    }

    #[test]
    fn all_strong_high_volume_rates_extreme() {
        // 100+ strong occurrences: 3 * 100 = 300, clamped to 100.
        let (label, score) = rate(&[category(Severity::Strong, 150)]);
        assert_eq!(score, 100);
        assert_eq!(label, RatingLabel::Extreme);
    }

    #[test]
    fn single_strong_word_does_not_dominate() {
        // One strong occurrence: 3/1 * 1 = 3 -> still Mild.
        let (label, score) = rate(&[category(Severity::Strong, 1)]);
        assert_eq!(score, 3);
        assert_eq!(label, RatingLabel::Mild);
    }

    #[test]
    fn upgrading_mild_to_strong_never_lowers_score() {
        // Fixed total of 40, shifting occurrences from mild to strong.
        let mut previous = 0;
        for strong in 0..=40u32 {
            let (_, score) = rate(&[
                category(Severity::Strong, strong),
                category(Severity::Mild, 40 - strong),
            ]);
            assert!(
                score >= previous,
                "score regressed at strong={strong}: {score} < {previous}"
            );
            previous = score;
        }
    }

    #[test]
    fn label_thresholds() {
        // 40 total, all mild: 1 * 40 = 40 -> Moderate boundary.
        assert_eq!(
            rate(&[category(Severity::Mild, 40)]).0,
            RatingLabel::Moderate
        );
        // 70 total, all mild: 70 -> Heavy boundary.
        assert_eq!(
            rate(&[category(Severity::Mild, 70)]).0,
            RatingLabel::Heavy
        );
        // 71 total, all mild: 71 -> Extreme.
        assert_eq!(
            rate(&[category(Severity::Mild, 71)]).0,
            RatingLabel::Extreme
        );
    }
}
