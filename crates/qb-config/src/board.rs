//! Typed board configuration.
//!
//! ```yaml
//! backend:
//!   url: "http://127.0.0.1:8000"      # required unless QB_BACKEND_URL is set
//!   snapshot_path: "/current_questions"
//!   stream_path: "/sse"
//!   cookie_env: "QB_SESSION_COOKIE"  # env var NAME, optional
//! stream:
//!   retry_ms: 3000
//!   channel_capacity: 256
//! daemon:
//!   bind: "127.0.0.1:8899"
//! ```

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Overrides `/backend/url` when set and non-blank.
pub const BACKEND_URL_ENV: &str = "QB_BACKEND_URL";

pub const DEFAULT_SNAPSHOT_PATH: &str = "/current_questions";
pub const DEFAULT_STREAM_PATH: &str = "/sse";
pub const DEFAULT_RETRY_MS: u64 = 3000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_DAEMON_BIND: &str = "127.0.0.1:8899";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Base URL without a trailing slash.
    pub backend_url: String,
    pub snapshot_path: String,
    pub stream_path: String,
    /// Name of the env var holding the cookie header value.
    pub cookie_env: Option<String>,
    pub retry: Duration,
    pub channel_capacity: usize,
    pub daemon_bind: String,
}

impl BoardConfig {
    /// Extract from a loaded config, reading overrides from the process env.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        Self::from_config_json_with_env(config_json, |name| std::env::var(name).ok())
    }

    /// Same as [`from_config_json`](Self::from_config_json) with an injected
    /// env lookup.
    pub fn from_config_json_with_env<F>(config_json: &Value, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_url = env(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty());
        let backend_url = match env_url.or_else(|| read_str_at(config_json, "/backend/url")) {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => bail!(
                "CONFIG_MISSING: /backend/url is not set and env var '{}' is empty",
                BACKEND_URL_ENV
            ),
        };
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            bail!("CONFIG_INVALID: backend url must be http(s), got '{backend_url}'");
        }

        let snapshot_path = normalize_path(
            read_str_at(config_json, "/backend/snapshot_path")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string()),
        );
        let stream_path = normalize_path(
            read_str_at(config_json, "/backend/stream_path")
                .unwrap_or_else(|| DEFAULT_STREAM_PATH.to_string()),
        );
        let cookie_env = read_str_at(config_json, "/backend/cookie_env");

        let retry_ms = read_u64_at(config_json, "/stream/retry_ms")?.unwrap_or(DEFAULT_RETRY_MS);
        let channel_capacity = match read_u64_at(config_json, "/stream/channel_capacity")? {
            Some(0) => bail!("CONFIG_INVALID: /stream/channel_capacity must be > 0"),
            Some(n) => usize::try_from(n).context("/stream/channel_capacity out of range")?,
            None => DEFAULT_CHANNEL_CAPACITY,
        };
        let daemon_bind = read_str_at(config_json, "/daemon/bind")
            .unwrap_or_else(|| DEFAULT_DAEMON_BIND.to_string());

        Ok(Self {
            backend_url,
            snapshot_path,
            stream_path,
            cookie_env,
            retry: Duration::from_millis(retry_ms),
            channel_capacity,
            daemon_bind,
        })
    }

    pub fn snapshot_url(&self) -> String {
        format!("{}{}", self.backend_url, self.snapshot_path)
    }

    pub fn stream_url(&self) -> String {
        format!("{}{}", self.backend_url, self.stream_path)
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_u64_at(config: &Value, pointer: &str) -> Result<Option<u64>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID: {pointer} must be a non-negative integer"),
        },
    }
}

fn normalize_path(p: String) -> String {
    if p.starts_with('/') {
        p
    } else {
        format!("/{p}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_fill_everything_but_url() {
        let v = serde_json::json!({"backend": {"url": "http://quiz.local/"}});
        let cfg = BoardConfig::from_config_json_with_env(&v, no_env).unwrap();
        assert_eq!(cfg.backend_url, "http://quiz.local");
        assert_eq!(cfg.snapshot_url(), "http://quiz.local/current_questions");
        assert_eq!(cfg.stream_url(), "http://quiz.local/sse");
        assert_eq!(cfg.retry, Duration::from_millis(3000));
        assert_eq!(cfg.channel_capacity, 256);
        assert_eq!(cfg.daemon_bind, "127.0.0.1:8899");
        assert!(cfg.cookie_env.is_none());
    }

    #[test]
    fn relative_paths_get_a_leading_slash() {
        assert_eq!(normalize_path("sse".to_string()), "/sse");
        assert_eq!(normalize_path("/sse".to_string()), "/sse");
    }

    #[test]
    fn non_integer_retry_is_rejected() {
        let v = serde_json::json!({
            "backend": {"url": "http://x"},
            "stream": {"retry_ms": "soon"}
        });
        let err = BoardConfig::from_config_json_with_env(&v, no_env).unwrap_err();
        assert!(err.to_string().contains("/stream/retry_ms"));
    }
}
