use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cusswatch_core::{
    AnalysisPipeline, Cache, CatalogClient, GeminiClassifier, GestdownProvider,
    MemoryCache, OpenSubtitlesProvider, ProviderRegistry, RedisCache,
    SubDlProvider, SubtitleProvider, TmdbClient,
};
use cusswatch_server::{AppState, Settings, routes};

#[derive(Parser, Debug)]
#[command(name = "cusswatch-server")]
#[command(about = "Profanity analysis service backed by subtitle providers")]
struct Cli {
    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Override via RUST_LOG.
                    "info,tower_http=warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings =
        Settings::load().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    if settings.providers.opensubtitles_api_key.is_none() {
        warn!("OpenSubtitles API key not set, provider will be skipped");
    }
    if settings.providers.subdl_api_key.is_none() {
        warn!("SubDL API key not set, provider will be skipped");
    }
    if settings.classifier.gemini_api_key.is_none() {
        warn!("Gemini API key not set, analysis requests will fail");
    }

    let cache: Arc<dyn Cache> = match &settings.redis_url {
        Some(url) => match RedisCache::connect(url).await {
            Ok(redis) => {
                info!("connected to redis cache");
                Arc::new(redis)
            }
            Err(err) => {
                warn!(%err, "redis unavailable, falling back to in-memory cache");
                Arc::new(MemoryCache::new())
            }
        },
        None => {
            info!("no redis configured, using in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build http client")?;

    let provider_settings = Arc::new(settings.providers.clone());
    let providers: Vec<Arc<dyn SubtitleProvider>> = vec![
        Arc::new(OpenSubtitlesProvider::new(
            client.clone(),
            cache.clone(),
            provider_settings.clone(),
        )),
        Arc::new(SubDlProvider::new(
            client.clone(),
            cache.clone(),
            provider_settings.clone(),
        )),
        Arc::new(GestdownProvider::new(
            client.clone(),
            cache.clone(),
            provider_settings.clone(),
        )),
    ];
    let registry = Arc::new(ProviderRegistry::new(providers));

    let classifier = Arc::new(GeminiClassifier::new(
        client.clone(),
        settings.classifier.clone(),
    ));

    let pipeline = Arc::new(AnalysisPipeline::new(
        registry,
        classifier,
        cache.clone(),
        settings.pipeline.clone(),
    ));

    let catalog = Arc::new(CatalogClient::new(
        client.clone(),
        cache.clone(),
        provider_settings.clone(),
    ));

    let tmdb = Arc::new(TmdbClient::new(
        client,
        cache.clone(),
        settings.tmdb.clone(),
    ));

    let state = AppState {
        pipeline,
        catalog,
        tmdb,
    };

    let app = routes::create_router(state);

    let addr: SocketAddr = format!(
        "{}:{}",
        settings.server.host, settings.server.port
    )
    .parse()
    .context("invalid bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "cusswatch server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => warn!(%err, "failed to install terminate handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
