//! Gemini-backed classifier.
//!
//! Transcripts above the chunk limit are split on whitespace boundaries
//! and classified sequentially; per-word counts merge additively across
//! chunks (case-insensitive) and the final chunk's summary stands for the
//! whole transcript. Transport and API errors fail loudly; a response the
//! model filled with unparseable JSON is recovered locally as an empty
//! result with a placeholder summary.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use cusswatch_model::{ProfanityWord, Severity};

use crate::settings::ClassifierSettings;

use super::{Classification, Classifier, ClassifyError};

pub struct GeminiClassifier {
    client: reqwest::Client,
    settings: ClassifierSettings,
}

impl std::fmt::Debug for GeminiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClassifier")
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// The JSON document the prompt asks the model to produce.
#[derive(Debug, Deserialize)]
struct ChunkResult {
    #[serde(default)]
    profanities: Vec<RawProfanity>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct RawProfanity {
    word: String,
    count: u32,
    category: String,
    severity: Severity,
}

impl GeminiClassifier {
    pub fn new(client: reqwest::Client, settings: ClassifierSettings) -> Self {
        Self { client, settings }
    }

    async fn classify_chunk(
        &self,
        text: &str,
        title: &str,
        chunk_num: usize,
        total_chunks: usize,
    ) -> Result<ChunkResult, ClassifyError> {
        let api_key = self
            .settings
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| {
                ClassifyError::NotConfigured("GEMINI_API_KEY is not set".into())
            })?;

        let prompt = build_prompt(text, title, chunk_num, total_chunks);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.1,
            },
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" },
                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" },
            ],
        });

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.gemini_base_url, self.settings.model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClassifyError::Status(response.status()));
        }

        let payload: GenerateResponse = response.json().await?;
        let text = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(ClassifyError::EmptyResponse)?;

        Ok(parse_chunk_document(&text))
    }
}

/// Parse the JSON document the model was asked to produce. A malformed
/// document is recovered locally as an empty word list with a placeholder
/// summary, not escalated.
fn parse_chunk_document(text: &str) -> ChunkResult {
    match serde_json::from_str::<ChunkResult>(text) {
        Ok(result) => result,
        Err(err) => {
            warn!(%err, "classification response was not valid JSON");
            ChunkResult {
                profanities: Vec::new(),
                summary: "Analysis failed to parse.".to_string(),
            }
        }
    }
}

/// Accumulates per-word counts across chunks, case-insensitively, while
/// preserving the order words were first reported in. The word list must
/// come out identical for identical inputs; a plain map's iteration order
/// would reshuffle ties downstream.
#[derive(Debug, Default)]
struct WordMerger {
    words: Vec<ProfanityWord>,
    index: HashMap<String, usize>,
}

impl WordMerger {
    fn absorb(&mut self, raws: Vec<RawProfanity>) {
        for raw in raws {
            let key = raw.word.to_lowercase();
            match self.index.get(&key) {
                Some(&pos) => self.words[pos].count += raw.count,
                None => {
                    self.index.insert(key.clone(), self.words.len());
                    self.words.push(ProfanityWord {
                        word: key,
                        count: raw.count,
                        category: raw.category,
                        severity: raw.severity,
                    });
                }
            }
        }
    }

    fn into_words(self) -> Vec<ProfanityWord> {
        self.words
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(
        &self,
        transcript: &str,
        title: &str,
    ) -> Result<Classification, ClassifyError> {
        let chunks = chunk_text(transcript, self.settings.chunk_chars);
        let total_chunks = chunks.len();
        info!(
            title,
            chars = transcript.len(),
            chunks = total_chunks,
            "classifying transcript"
        );

        let mut merger = WordMerger::default();
        let mut summary = String::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let result = self
                .classify_chunk(chunk, title, index + 1, total_chunks)
                .await?;

            merger.absorb(result.profanities);

            if index + 1 == total_chunks {
                summary = result.summary;
            }
        }

        Ok(Classification {
            words: merger.into_words(),
            summary,
        })
    }
}

fn build_prompt(
    text: &str,
    title: &str,
    chunk_num: usize,
    total_chunks: usize,
) -> String {
    format!(
        r#"You are a profanity detection expert. Analyze the following subtitle text from "{title}" and identify ALL profanities, vulgar language, obscenities, slurs, crude language, and offensive terms.

IMPORTANT RULES:
- Catch ALL variations and misspellings of profanity (e.g., "f***", "sh1t", "a$$", "b!tch")
- Count EVERY occurrence of each word accurately
- Categorize each word into one of these categories:
  - "General Profanity" (f-word, s-word, damn, hell, ass, etc.)
  - "Sexual/Crude" (sexually explicit terms)
  - "Religious/Profane" (blasphemy, taking deity names in vain)
  - "Slurs/Hate Speech" (racial, ethnic, homophobic slurs)
  - "Violence/Threats" (violent or threatening language)
  - "Scatological" (bathroom/bodily function crude terms)
  - "Insults" (b*tch, bastard, idiot used as insults, etc.)
  - "Substance References" (crude drug/alcohol references)
- Rate severity as: "mild" (damn, hell, crap), "moderate" (s-word, ass, bastard), "strong" (f-word, slurs, c-word)
- Be thorough - do not miss any profanity
- This is chunk {chunk_num} of {total_chunks}

Return a JSON object with this EXACT structure:
{{
  "profanities": [
    {{"word": "the word", "count": number_of_occurrences, "category": "category name", "severity": "mild|moderate|strong"}}
  ],
  "summary": "A brief summary of the profanity level found"
}}

Subtitle text to analyze:
{text}"#
    )
}

/// Split text into chunks of at most `max_chars` bytes, preferring to break
/// on whitespace. Always splits on UTF-8 character boundaries.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + max_chars).min(text.len());
        if end < text.len() {
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }
            if let Some(pos) = text[start..end].rfind(char::is_whitespace) {
                if pos > 0 {
                    end = start + pos;
                }
            }
            // A pathological run without whitespace still makes progress.
            if end <= start {
                end = (start + max_chars).min(text.len());
                while end < text.len() && !text.is_char_boundary(end) {
                    end += 1;
                }
            }
        }
        chunks.push(text[start..end].to_string());
        start = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(word: &str, count: u32) -> RawProfanity {
        RawProfanity {
            word: word.to_string(),
            count,
            category: "General Profanity".to_string(),
            severity: Severity::Mild,
        }
    }

    #[test]
    fn merge_preserves_first_seen_order_across_chunks() {
        let mut merger = WordMerger::default();
        merger.absorb(vec![raw("damn", 3), raw("hell", 3)]);
        merger.absorb(vec![raw("crap", 3), raw("damn", 2)]);

        let words = merger.into_words();
        let order: Vec<&str> =
            words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(order, ["damn", "hell", "crap"]);
        assert_eq!(words[0].count, 5);
        assert_eq!(words[1].count, 3);
        assert_eq!(words[2].count, 3);
    }

    #[test]
    fn merge_folds_case_variants_into_one_word() {
        let mut merger = WordMerger::default();
        merger.absorb(vec![raw("Damn", 1)]);
        merger.absorb(vec![raw("DAMN", 2), raw("damn", 1)]);

        let words = merger.into_words();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "damn");
        assert_eq!(words[0].count, 4);
    }

    #[test]
    fn valid_chunk_document_parses() {
        let doc = r#"{
            "profanities": [
                {"word": "damn", "count": 2, "category": "General Profanity", "severity": "mild"}
            ],
            "summary": "Light profanity throughout."
        }"#;
        let result = parse_chunk_document(doc);
        assert_eq!(result.profanities.len(), 1);
        assert_eq!(result.profanities[0].word, "damn");
        assert_eq!(result.summary, "Light profanity throughout.");
    }

    #[test]
    fn malformed_chunk_document_recovers_as_empty() {
        let result = parse_chunk_document("I found some bad words: damn");
        assert!(result.profanities.is_empty());
        assert_eq!(result.summary, "Analysis failed to parse.");
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("hello world", 100);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn long_text_splits_on_whitespace() {
        let text = "alpha beta gamma delta";
        let chunks = chunk_text(text, 12);
        assert!(chunks.len() > 1);
        // No word is cut in half.
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(text.split_whitespace().any(|w| w == word));
            }
        }
        // Nothing is lost.
        let rejoined: Vec<&str> =
            chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn whitespace_free_text_still_terminates() {
        let text = "a".repeat(25);
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn splits_respect_multibyte_boundaries() {
        let text = "é".repeat(30); // 2 bytes per char
        let chunks = chunk_text(&text, 11);
        assert_eq!(chunks.concat(), text);
        for chunk in chunks {
            assert!(chunk.chars().all(|c| c == 'é'));
        }
    }
}
