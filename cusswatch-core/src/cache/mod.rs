//! Injected cache abstraction.
//!
//! The cache is the only shared mutable state across concurrent pipeline
//! runs. Writes are whole-value overwrites under one key (last-writer-wins),
//! so backends need no coordination beyond their own atomicity. All cache
//! traffic is best-effort: backends log failures and degrade to a miss or a
//! dropped write rather than erroring into the caller.

mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use cusswatch_model::ContentType;

/// Key-value store with per-key TTL. Values are serialized JSON strings.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Fetch and deserialize a cached value, treating malformed payloads as a
/// miss.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Option<T> {
    let raw = cache.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, %err, "discarding undeserializable cache entry");
            None
        }
    }
}

/// Serialize and store a value; serialization failures drop the write.
pub async fn set_json<T: Serialize>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.set(key, raw, ttl).await,
        Err(err) => warn!(key, %err, "failed to serialize cache value"),
    }
}

/// TTL policy, one constant per cached concern.
pub mod ttl {
    use std::time::Duration;

    /// Title search results from the features endpoint.
    pub const FEATURES: Duration = Duration::from_secs(30 * 60);
    /// Per-provider subtitle search results.
    pub const SUBTITLE_SEARCH: Duration = Duration::from_secs(60 * 60);
    /// Raw downloaded subtitle content.
    pub const SUBTITLE_CONTENT: Duration = Duration::from_secs(24 * 60 * 60);
    /// Gestdown show-id lookups.
    pub const SHOW_LOOKUP: Duration = Duration::from_secs(24 * 60 * 60);
    /// Season episode listings.
    pub const EPISODES: Duration = Duration::from_secs(60 * 60);
    /// TMDB detail enrichment.
    pub const METADATA: Duration = Duration::from_secs(24 * 60 * 60);
    /// Completed analysis results.
    pub const ANALYSIS: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Deterministic cache key builders. Provider-owned keys carry the provider
/// prefix so independent sources can never collide.
#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    pub fn analysis(
        tmdb_id: u64,
        content_type: ContentType,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> String {
        let season = season.map(|s| s.to_string()).unwrap_or_default();
        let episode = episode.map(|e| e.to_string()).unwrap_or_default();
        format!("analysis:{tmdb_id}:{content_type}:s{season}e{episode}")
    }

    pub fn features(query: &str) -> String {
        format!("os:features:{}", query.to_lowercase())
    }

    pub fn episodes(tmdb_id: u64, season: u32) -> String {
        format!("os:episodes:{tmdb_id}:{season}")
    }

    pub fn os_search(
        tmdb_id: u64,
        content_type: ContentType,
        language: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> String {
        let season = season.map(|s| s.to_string()).unwrap_or_default();
        let episode = episode.map(|e| e.to_string()).unwrap_or_default();
        format!("os:search:{tmdb_id}:{content_type}:{language}:s{season}e{episode}")
    }

    pub fn os_content(file_id: i64) -> String {
        format!("os:content:{file_id}")
    }

    pub fn subdl_content(url_path: &str) -> String {
        format!("subdl:content:{url_path}")
    }

    pub fn gestdown_show(title: &str) -> String {
        format!("gestdown:show:{}", title.to_lowercase())
    }

    pub fn gestdown_content(subtitle_id: &str) -> String {
        format!("gestdown:content:{subtitle_id}")
    }

    pub fn tmdb_details(content_type: ContentType, tmdb_id: u64) -> String {
        format!("tmdb:details:{content_type}:{tmdb_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_key_omits_absent_coordinates() {
        let movie = CacheKeys::analysis(603, ContentType::Movie, None, None);
        assert_eq!(movie, "analysis:603:movie:se");

        let episode =
            CacheKeys::analysis(1396, ContentType::Episode, Some(2), Some(7));
        assert_eq!(episode, "analysis:1396:tvshow:s2e7");
    }

    #[test]
    fn provider_keys_are_namespaced() {
        assert!(CacheKeys::os_content(42).starts_with("os:"));
        assert!(CacheKeys::subdl_content("/x.zip").starts_with("subdl:"));
        assert!(CacheKeys::gestdown_content("abc").starts_with("gestdown:"));
    }
}
