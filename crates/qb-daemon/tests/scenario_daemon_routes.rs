//! In-process scenario tests for qb-daemon HTTP endpoints.
//!
//! The router is driven via `tower::ServiceExt::oneshot`; no TCP socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use qb_board::{BoardState, ManualTimers};
use qb_daemon::{routes, state};
use qb_runtime::{BoardMsg, BoardRuntime, Publisher, SourceFeed, Sources};
use qb_stream::StreamOccurrence;
use qb_testkit::{answer_event, reload_event, reload_payload};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_state() -> Arc<state::AppState> {
    Arc::new(state::AppState::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn call_json(router: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (
        status,
        serde_json::from_slice(&body).expect("body is not valid JSON"),
    )
}

/// Read SSE body frames until `needle` shows up.
async fn read_sse_until(body: Body, needle: &str) -> String {
    let mut body = body;
    let mut seen = String::new();
    let read = async {
        while let Some(frame) = body.frame().await {
            let frame = frame.expect("sse frame");
            if let Some(bytes) = frame.data_ref() {
                seen.push_str(&String::from_utf8_lossy(bytes));
                if seen.contains(needle) {
                    return;
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("needle within timeout");
    seen
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let (status, json) = call_json(routes::build_router(make_state()), get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "qb-daemon");
    assert!(json["config_hash"].is_null());
}

#[tokio::test]
async fn health_reports_config_hash_when_present() {
    let publisher = Publisher::new(BoardState::new().view(), 16);
    let st = Arc::new(state::AppState::new(publisher, Some("abc123".to_string())));
    let (_, json) = call_json(routes::build_router(st), get("/v1/health")).await;
    assert_eq!(json["config_hash"], "abc123");
}

// ---------------------------------------------------------------------------
// GET /v1/board
// ---------------------------------------------------------------------------

#[tokio::test]
async fn board_starts_empty_with_full_gauge() {
    let (status, json) = call_json(routes::build_router(make_state()), get("/v1/board")).await;
    assert_eq!(status, StatusCode::OK);
    let view = &json["view"];
    assert_eq!(view["generation"], 0);
    assert_eq!(view["progress"], 100.0);
    assert_eq!(view["cards"].as_array().unwrap().len(), 0);
    assert_eq!(view["connection"], "connected");
    assert_eq!(view["all_clear"], false);
}

#[tokio::test]
async fn board_reflects_latest_published_view() {
    let st = make_state();

    let mut board = BoardState::new();
    let mut timers = ManualTimers::new();
    board.apply(reload_event(&[1, 2]), &mut timers);
    board.apply(answer_event(2, true), &mut timers);
    st.publisher.publish_view(board.view()).await;

    let (_, json) = call_json(routes::build_router(st), get("/v1/board")).await;
    let cards = json["view"]["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0]["is_correct"], false);
    assert_eq!(cards[1]["is_correct"], true);
    assert_eq!(cards[1]["key"], "2-9baa");
    assert_eq!(json["view"]["entering"], true);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = routes::build_router(make_state())
        .oneshot(get("/v1/nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// GET /v1/stream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_starts_with_current_view() {
    let resp = routes::build_router(make_state())
        .oneshot(get("/v1/stream"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let seen = read_sse_until(resp.into_body(), "\n\n").await;
    assert!(seen.contains("event: view"), "{seen}");
    assert!(seen.contains("\"type\":\"view\""), "{seen}");
}

#[tokio::test]
async fn stream_forwards_bus_messages() {
    let st = make_state();
    let resp = routes::build_router(Arc::clone(&st))
        .oneshot(get("/v1/stream"))
        .await
        .unwrap();

    st.publisher.log_line("WARN", "stream reconnecting: test");
    let seen = read_sse_until(resp.into_body(), "stream reconnecting").await;
    assert!(seen.contains("event: log"), "{seen}");
}

// ---------------------------------------------------------------------------
// Runtime wired behind the router
// ---------------------------------------------------------------------------

#[tokio::test]
async fn runtime_updates_are_served() {
    let st = make_state();
    let mut bus = st.publisher.subscribe();
    let (sources, SourceFeed { occurrences, seed: _seed }) = Sources::channels(8);
    let runtime = BoardRuntime::spawn(sources, st.publisher.clone());

    occurrences
        .send(StreamOccurrence::Message(reload_payload(&[5, 6, 7])))
        .await
        .unwrap();
    // Wait for the reload view to be published.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(BoardMsg::View(v)) = bus.recv().await {
                if v.generation == 1 {
                    return;
                }
            }
        }
    })
    .await
    .expect("reload view published");

    let (_, json) = call_json(routes::build_router(Arc::clone(&st)), get("/v1/board")).await;
    let indices: Vec<u64> = json["view"]["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![5, 6, 7]);

    runtime.shutdown().await;
}
