//! Axum router and HTTP handlers for qb-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use futures_util::{stream, Stream, StreamExt};
use qb_runtime::BoardMsg;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::{
    api_types::{BoardResponse, HealthResponse},
    state::{uptime_secs, AppState},
};

/// Build the application router wired to the given shared state.
///
/// CORS and tracing layers are **not** applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/board", get(board))
        .route("/v1/stream", get(stream_handler))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.clone(),
            version: st.build.version.clone(),
            daemon_uptime_secs: uptime_secs(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/board
// ---------------------------------------------------------------------------

pub(crate) async fn board(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let view = st.publisher.latest().await;
    (
        StatusCode::OK,
        Json(BoardResponse {
            daemon_uptime_secs: uptime_secs(),
            view,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

/// The current view first, then every bus message as it is published.
pub(crate) async fn stream_handler(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    // Subscribe before reading the view so nothing published in between is lost.
    let rx = st.publisher.subscribe();
    let current = BoardMsg::View(st.publisher.latest().await);
    debug!("sse client subscribed");

    let events = stream::iter(to_event(&current).map(Ok)).chain(broadcast_to_sse(rx));
    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BoardMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => to_event(&m).map(Ok),
            // Lagged: the next view supersedes whatever was skipped.
            Err(_) => None,
        }
    })
}

fn to_event(msg: &BoardMsg) -> Option<Event> {
    let name = match msg {
        BoardMsg::Heartbeat { .. } => "heartbeat",
        BoardMsg::View(_) => "view",
        BoardMsg::LogLine { .. } => "log",
    };
    let data = serde_json::to_string(msg).ok()?;
    Some(Event::default().event(name).data(data))
}
