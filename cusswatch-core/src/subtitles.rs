//! Subtitle format normalization.
//!
//! Strips the structural skeleton of an SRT-style file (sequence numbers,
//! timestamp ranges, markup tags) and collapses the remaining dialogue into
//! one whitespace-joined transcript. Providers ship wildly different files;
//! this normalization is what makes a single length-based quality gate
//! meaningful across all of them.

use std::sync::LazyLock;

use regex::Regex;

static SEQUENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static TIMESTAMP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}").unwrap());
static ANGLE_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static BRACE_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());

/// Reduce raw subtitle content to plain dialogue text.
///
/// Pure and deterministic; idempotent under re-application (the output
/// contains no structural lines to strip).
pub fn parse_srt(raw: &str) -> String {
    let mut dialogue: Vec<String> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if SEQUENCE_LINE.is_match(trimmed) {
            continue;
        }
        if TIMESTAMP_LINE.is_match(trimmed) {
            continue;
        }

        let without_angle = ANGLE_TAGS.replace_all(trimmed, "");
        let cleaned = BRACE_TAGS.replace_all(&without_angle, "");
        let cleaned = cleaned.trim();

        if !cleaned.is_empty() {
            dialogue.push(cleaned.to_string());
        }
    }

    dialogue.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1
00:00:01,000 --> 00:00:04,000
<b>Hello</b> there.

2
00:00:05,000 --> 00:00:08,000
{\\an8}General Kenobi!
<i>You are</i> a bold one.
";

    #[test]
    fn strips_structural_lines_and_markup() {
        let parsed = parse_srt(SAMPLE);
        assert_eq!(parsed, "Hello there. General Kenobi! You are a bold one.");
    }

    #[test]
    fn idempotent_under_reapplication() {
        let once = parse_srt(SAMPLE);
        assert_eq!(parse_srt(&once), once);
    }

    #[test]
    fn empty_and_whitespace_input_yield_empty_transcript() {
        assert_eq!(parse_srt(""), "");
        assert_eq!(parse_srt("\n  \n\t\n"), "");
    }

    #[test]
    fn drops_lines_that_are_only_markup() {
        assert_eq!(parse_srt("<font color=\"red\"></font>\nreal line"), "real line");
    }

    #[test]
    fn keeps_dialogue_starting_with_digits() {
        // "42 years" is dialogue; a bare "42" is a sequence number.
        assert_eq!(parse_srt("42 years ago\n42\n"), "42 years ago");
    }

    #[test]
    fn drops_timestamp_variants() {
        let raw = "00:01:02,500 --> 00:01:04,000\n00:01:02.500\nline";
        assert_eq!(parse_srt(raw), "line");
    }
}
