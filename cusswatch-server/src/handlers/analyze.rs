use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{error, info};

use cusswatch_core::ProgressSink;
use cusswatch_model::Feature;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub feature: Feature,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
}

/// `POST /api/analyze` - run an analysis, streaming progress as SSE.
///
/// A fresh cache hit is answered as a plain JSON body instead of a
/// stream; everything else gets the event sequence ending in either a
/// `complete` event carrying the result or an `error` event.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let AnalyzeRequest {
        mut feature,
        season,
        episode,
    } = request;

    if let Some(result) = state.pipeline.cached(&feature, season, episode).await
    {
        info!(
            tmdb_id = feature.tmdb_id,
            "serving cached analysis without streaming"
        );
        return Json(json!({ "result": result, "from_cache": true }))
            .into_response();
    }

    // Best-effort metadata fill before the run so the stored result
    // carries poster/overview data. Failures leave the feature as-is.
    state.tmdb.enrich(&mut feature).await;

    let (tx, rx) = mpsc::channel(32);
    let sink = ProgressSink::attached(tx);
    let pipeline = state.pipeline.clone();

    tokio::spawn(async move {
        // Terminal outcomes are already mirrored onto the sink; the
        // returned value only matters for logging here.
        if let Err(err) = pipeline.run(feature, season, episode, &sink).await {
            error!(%err, "analysis run failed");
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok::<Event, Infallible>(
            Event::default()
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().data("{}")),
        )
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
