//! Provider fan-out and result merging.

use std::sync::Arc;

use tracing::{error, info};

use cusswatch_model::SearchRequest;

use super::{SubtitleCandidate, SubtitleProvider};

/// Owns the configured providers and coordinates concurrent searches.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SubtitleProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ProviderRegistry {
    /// Registration order is significant: it fixes both the fan-out order
    /// and the round-robin iteration order of the merge.
    pub fn new(providers: Vec<Arc<dyn SubtitleProvider>>) -> Self {
        Self { providers }
    }

    /// Query every applicable provider concurrently and merge the results.
    ///
    /// Settle-all semantics: every search task runs to completion
    /// independently; a slow or panicking provider neither blocks nor
    /// cancels the others. Task failures are logged and discarded.
    pub async fn search_all(
        &self,
        request: &SearchRequest,
    ) -> Vec<SubtitleCandidate> {
        let applicable: Vec<Arc<dyn SubtitleProvider>> = self
            .providers
            .iter()
            .filter(|p| p.supports(request.content_type))
            .cloned()
            .collect();

        info!(
            title = %request.title,
            content_type = %request.content_type,
            providers = applicable.len(),
            season = ?request.season,
            episode = ?request.episode,
            "searching subtitle providers"
        );

        let tasks: Vec<_> = applicable
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let request = request.clone();
                tokio::spawn(async move { provider.search(&request).await })
            })
            .collect();

        let settled = futures::future::join_all(tasks).await;

        let mut candidates = Vec::new();
        for (outcome, provider) in settled.into_iter().zip(&applicable) {
            match outcome {
                Ok(found) => {
                    info!(
                        provider = provider.name(),
                        candidates = found.len(),
                        "provider search settled"
                    );
                    candidates.extend(found);
                }
                Err(err) => {
                    error!(
                        provider = provider.name(),
                        %err,
                        "provider search task failed"
                    );
                }
            }
        }

        let merged = interleave_by_provider(candidates);
        info!(total = merged.len(), "merged candidate list ready");
        merged
    }
}

/// Round-robin interleave across per-provider ranked lists.
///
/// Groups keep first-seen provider order; within a group candidates are
/// sorted descending by download count (stable, so input order breaks
/// ties). Rounds then take one candidate per provider, skipping exhausted
/// groups, until every group is drained. This spreads download attempts
/// across sources so a single provider's rate limit cannot eat the whole
/// attempt budget.
fn interleave_by_provider(
    candidates: Vec<SubtitleCandidate>,
) -> Vec<SubtitleCandidate> {
    let mut groups: Vec<(&'static str, Vec<SubtitleCandidate>)> = Vec::new();
    for candidate in candidates {
        match groups.iter_mut().find(|(name, _)| *name == candidate.provider)
        {
            Some((_, group)) => group.push(candidate),
            None => groups.push((candidate.provider, vec![candidate])),
        }
    }

    for (_, group) in &mut groups {
        group.sort_by(|a, b| b.download_count.cmp(&a.download_count));
    }

    let mut merged = Vec::new();
    let mut round = 0;
    loop {
        let mut took_any = false;
        for (_, group) in &groups {
            if let Some(candidate) = group.get(round) {
                merged.push(candidate.clone());
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
        round += 1;
    }

    merged
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use cusswatch_model::{ContentType, SearchRequest};

    use super::*;
    use crate::providers::{ProviderError, SubtitleFetch};

    struct NoFetch;

    #[async_trait]
    impl SubtitleFetch for NoFetch {
        async fn fetch(&self) -> Result<String, ProviderError> {
            Err(ProviderError::Api("not downloadable in tests".into()))
        }
    }

    fn candidate(
        provider: &'static str,
        id: &str,
        download_count: u64,
    ) -> SubtitleCandidate {
        SubtitleCandidate::new(
            id.to_string(),
            provider,
            "en".to_string(),
            "test-release".to_string(),
            download_count,
            false,
            Arc::new(NoFetch),
        )
    }

    struct StaticProvider {
        name: &'static str,
        movies_only: bool,
        results: Vec<(String, u64)>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SubtitleProvider for StaticProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supports(&self, content_type: ContentType) -> bool {
            !self.movies_only || content_type == ContentType::Movie
        }

        async fn search(
            &self,
            _request: &SearchRequest,
        ) -> Vec<SubtitleCandidate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .iter()
                .map(|(id, count)| candidate(self.name, id, *count))
                .collect()
        }
    }

    fn request(content_type: ContentType) -> SearchRequest {
        SearchRequest {
            tmdb_id: 603,
            imdb_id: None,
            content_type,
            title: "The Matrix".to_string(),
            year: Some(1999),
            language: "en".to_string(),
            season: None,
            episode: None,
        }
    }

    #[test]
    fn interleave_matches_reference_ordering() {
        // A [10, 5], B [8], C [20, 1] must merge to
        // [A10, B8, C20, A5, C1] with providers cycled in first-seen order.
        let input = vec![
            candidate("a", "a10", 10),
            candidate("a", "a5", 5),
            candidate("b", "b8", 8),
            candidate("c", "c20", 20),
            candidate("c", "c1", 1),
        ];
        let merged = interleave_by_provider(input);
        let ids: Vec<&str> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a10", "b8", "c20", "a5", "c1"]);
    }

    #[test]
    fn interleave_sorts_within_provider_before_merging() {
        let input = vec![
            candidate("a", "low", 1),
            candidate("a", "high", 99),
            candidate("a", "mid", 50),
        ];
        let merged = interleave_by_provider(input);
        let ids: Vec<&str> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["high", "mid", "low"]);
    }

    #[test]
    fn interleave_of_nothing_is_nothing() {
        assert!(interleave_by_provider(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn search_all_skips_unsupporting_providers() {
        let movie_calls = Arc::new(AtomicUsize::new(0));
        let episode_calls = Arc::new(AtomicUsize::new(0));

        let registry = ProviderRegistry::new(vec![
            Arc::new(StaticProvider {
                name: "movies-only",
                movies_only: true,
                results: vec![("m1".to_string(), 3)],
                calls: Arc::clone(&movie_calls),
            }),
            Arc::new(StaticProvider {
                name: "everything",
                movies_only: false,
                results: vec![("e1".to_string(), 7)],
                calls: Arc::clone(&episode_calls),
            }),
        ]);

        let found = registry.search_all(&request(ContentType::Episode)).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].provider, "everything");
        assert_eq!(movie_calls.load(Ordering::SeqCst), 0);
        assert_eq!(episode_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_all_merges_across_providers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ProviderRegistry::new(vec![
            Arc::new(StaticProvider {
                name: "first",
                movies_only: false,
                results: vec![("f2".to_string(), 2), ("f9".to_string(), 9)],
                calls: Arc::clone(&calls),
            }),
            Arc::new(StaticProvider {
                name: "second",
                movies_only: false,
                results: vec![("s5".to_string(), 5)],
                calls: Arc::clone(&calls),
            }),
        ]);

        let found = registry.search_all(&request(ContentType::Movie)).await;
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["f9", "s5", "f2"]);
    }
}
