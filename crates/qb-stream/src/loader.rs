//! Initial snapshot loader.
//!
//! One GET against the snapshot endpoint. Failure is never fatal to the
//! caller; the board just stays unseeded until the first stream reload.

use std::time::Duration;

use qb_schemas::{CurrentQuestionsResponse, WireQuestion};
use reqwest::header::{CACHE_CONTROL, COOKIE};
use tracing::{debug, info};

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("snapshot request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("snapshot http status {0}")]
    Status(u16),
    #[error("snapshot body decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// **Cookie is redacted in `Debug`.**
#[derive(Clone)]
pub struct SnapshotLoader {
    http: reqwest::Client,
    url: String,
    cookie: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for SnapshotLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotLoader")
            .field("url", &self.url)
            .field("cookie", &self.cookie.as_ref().map(|_| "<REDACTED>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SnapshotLoader {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            cookie: None,
            timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Vec<WireQuestion>, LoadError> {
        let mut req = self
            .http
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .timeout(self.timeout);
        if let Some(cookie) = &self.cookie {
            req = req.header(COOKIE, cookie);
        }

        let resp = req.send().await.map_err(LoadError::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(LoadError::Transport)?;
        debug!(url = %self.url, bytes = body.len(), "snapshot body received");
        let parsed: CurrentQuestionsResponse =
            serde_json::from_slice(&body).map_err(LoadError::Decode)?;

        info!(
            url = %self.url,
            questions = parsed.current_questions.len(),
            "snapshot fetched"
        );
        Ok(parsed.current_questions)
    }
}
