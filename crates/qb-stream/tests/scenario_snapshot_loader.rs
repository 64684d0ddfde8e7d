//! Scenario: initial snapshot fetch against a mock backend.

use httpmock::prelude::*;
use qb_stream::{LoadError, SnapshotLoader};
use qb_testkit::{current_questions_body, wire_batch};

#[tokio::test]
async fn fetch_returns_current_questions() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/current_questions")
                .header("cache-control", "no-cache");
            then.status(200)
                .header("content-type", "application/json")
                .body(current_questions_body(wire_batch(&[4, 5, 6])));
        })
        .await;

    let loader = SnapshotLoader::new(reqwest::Client::new(), server.url("/current_questions"));
    let questions = loader.fetch().await.unwrap();

    assert_eq!(
        questions.iter().map(|q| q.index).collect::<Vec<_>>(),
        vec![4, 5, 6]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn cookie_is_attached_when_configured() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/current_questions")
                .header("cookie", "session=abc");
            then.status(200).body(current_questions_body(wire_batch(&[1])));
        })
        .await;

    let loader = SnapshotLoader::new(reqwest::Client::new(), server.url("/current_questions"))
        .with_cookie(Some("session=abc".to_string()));
    assert_eq!(loader.fetch().await.unwrap().len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn non_2xx_is_a_status_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/current_questions");
            then.status(503).body("down");
        })
        .await;

    let loader = SnapshotLoader::new(reqwest::Client::new(), server.url("/current_questions"));
    match loader.fetch().await {
        Err(LoadError::Status(503)) => {}
        other => panic!("expected Status(503), got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/current_questions");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let loader = SnapshotLoader::new(reqwest::Client::new(), server.url("/current_questions"));
    assert!(matches!(loader.fetch().await, Err(LoadError::Decode(_))));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Port 9 (discard) is not listening in test environments.
    let loader = SnapshotLoader::new(reqwest::Client::new(), "http://127.0.0.1:9/current_questions");
    assert!(matches!(loader.fetch().await, Err(LoadError::Transport(_))));
}
