//! Server configuration.
//!
//! Loaded from `CUSSWATCH_`-prefixed environment variables with `__` as
//! the section separator (`CUSSWATCH_SERVER__PORT=9000`,
//! `CUSSWATCH_PROVIDERS__SUBDL_API_KEY=...`). Every field has a default,
//! so an empty environment yields a running, keyless instance.

use serde::Deserialize;

use cusswatch_core::settings::{
    ClassifierSettings, PipelineSettings, ProviderSettings, TmdbSettings,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    /// When set, analysis and provider caches live in Redis; otherwise an
    /// in-process cache is used.
    pub redis_url: Option<String>,
    pub providers: ProviderSettings,
    pub pipeline: PipelineSettings,
    pub classifier: ClassifierSettings,
    pub tmdb: TmdbSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(
                ::config::Environment::with_prefix("CUSSWATCH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_keyless_instance() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(settings.redis_url.is_none());
        assert!(settings.providers.opensubtitles_api_key.is_none());
        assert_eq!(settings.pipeline.attempt_cap, 5);
    }
}
