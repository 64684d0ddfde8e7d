//! Stream client: one long-lived SSE subscription with transport retry.
//!
//! [`StreamClient::spawn`] starts a tokio task that connects, forwards
//! occurrences over a bounded channel in delivery order, and on any error or
//! end-of-stream emits `Errored`, sleeps the retry delay and reconnects.
//! There is no backoff growth; the delay is the configured default unless
//! the server sent a `retry:` field.
//!
//! The task ends when [`StreamHandle`] is closed or dropped, or when the
//! receiving side goes away.

use std::convert::Infallible;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, COOKIE};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sse::SseDecoder;

pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

const LAST_EVENT_ID: &str = "Last-Event-ID";

/// What the stream surfaces to its consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamOccurrence {
    Opened,
    /// Transport failure or end-of-stream; a reconnect follows.
    Errored(String),
    /// Raw payload of one unnamed SSE event.
    Message(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {0}")]
    Status(u16),
    #[error("unexpected content-type {0:?}")]
    ContentType(String),
    #[error("stream ended")]
    Ended,
    #[error("receiver dropped")]
    ReceiverGone,
}

/// Connection settings. **Cookie is redacted in `Debug`.**
#[derive(Clone)]
pub struct StreamOptions {
    pub url: String,
    pub cookie: Option<String>,
    pub retry: Duration,
    pub channel_capacity: usize,
}

impl std::fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamOptions")
            .field("url", &self.url)
            .field("cookie", &self.cookie.as_ref().map(|_| "<REDACTED>"))
            .field("retry", &self.retry)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl StreamOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookie: None,
            retry: DEFAULT_RETRY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

pub struct StreamClient;

impl StreamClient {
    /// Must be called inside a tokio runtime.
    pub fn spawn(
        http: reqwest::Client,
        options: StreamOptions,
    ) -> (StreamHandle, mpsc::Receiver<StreamOccurrence>) {
        let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
        let (close_tx, close_rx) = watch::channel(false);
        let task = tokio::spawn(run(http, options, tx, close_rx));
        (
            StreamHandle {
                close_tx,
                closed: false,
                task: Some(task),
            },
            rx,
        )
    }
}

/// Owns the subscription. Closing is idempotent; dropping closes.
#[derive(Debug)]
pub struct StreamHandle {
    close_tx: watch::Sender<bool>,
    closed: bool,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Returns `true` only for the call that actually closed the stream.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        let _ = self.close_tx.send(true);
        debug!("stream close requested");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close and wait for the connection task to finish.
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "stream task join failed");
            }
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

async fn wait_closed(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn run(
    http: reqwest::Client,
    options: StreamOptions,
    tx: mpsc::Sender<StreamOccurrence>,
    mut close_rx: watch::Receiver<bool>,
) {
    let mut decoder = SseDecoder::new();
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let outcome = tokio::select! {
            biased;
            _ = wait_closed(&mut close_rx) => break,
            outcome = pump(&http, &options, &mut decoder, &tx) => outcome,
        };

        let err = match outcome {
            Err(StreamError::ReceiverGone) => break,
            Err(err) => err,
            Ok(never) => match never {},
        };

        let delay = decoder.retry().unwrap_or(options.retry);
        warn!(
            url = %options.url,
            attempt,
            error = %err,
            retry_ms = delay.as_millis() as u64,
            "sse stream error; reconnecting"
        );
        // A full channel must not hold up close.
        let sent = tokio::select! {
            biased;
            _ = wait_closed(&mut close_rx) => break,
            sent = tx.send(StreamOccurrence::Errored(err.to_string())) => sent,
        };
        if sent.is_err() {
            break;
        }
        decoder.reset();

        tokio::select! {
            biased;
            _ = wait_closed(&mut close_rx) => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    debug!(url = %options.url, "sse stream task finished");
}

/// Runs one connection until it fails. Never returns `Ok`.
async fn pump(
    http: &reqwest::Client,
    options: &StreamOptions,
    decoder: &mut SseDecoder,
    tx: &mpsc::Sender<StreamOccurrence>,
) -> Result<Infallible, StreamError> {
    let mut req = http
        .get(&options.url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");
    if let Some(cookie) = &options.cookie {
        req = req.header(COOKIE, cookie);
    }
    if let Some(id) = decoder.last_event_id() {
        req = req.header(LAST_EVENT_ID, id);
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(StreamError::Status(status.as_u16()));
    }
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("text/event-stream") {
        return Err(StreamError::ContentType(content_type));
    }

    info!(url = %options.url, "sse stream opened");
    tx.send(StreamOccurrence::Opened)
        .await
        .map_err(|_| StreamError::ReceiverGone)?;

    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for frame in decoder.push(&chunk) {
            if !frame.is_message() {
                debug!(event = %frame.event, "ignoring named sse event");
                continue;
            }
            tx.send(StreamOccurrence::Message(frame.data))
                .await
                .map_err(|_| StreamError::ReceiverGone)?;
        }
    }
    Err(StreamError::Ended)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_debug_redacts_cookie() {
        let opts = StreamOptions::new("http://x/sse").with_cookie(Some("session=s3cr3t".into()));
        let dbg = format!("{opts:?}");
        assert!(!dbg.contains("s3cr3t"));
        assert!(dbg.contains("http://x/sse"));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let opts = StreamOptions::new("http://x").with_channel_capacity(0);
        assert_eq!(opts.channel_capacity, 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (mut handle, _rx) =
            StreamClient::spawn(reqwest::Client::new(), StreamOptions::new("http://127.0.0.1:9/sse"));
        assert!(handle.close());
        assert!(!handle.close());
        assert!(handle.is_closed());
        handle.shutdown().await;
    }
}
