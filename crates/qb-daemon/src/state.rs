//! Shared state for qb-daemon handlers.
//!
//! The board runtime owns the view; the daemon only holds the
//! [`Publisher`] side to read the latest view and subscribe to the bus.

use std::time::Duration;

use qb_board::BoardState;
use qb_runtime::{BoardMsg, Publisher, DEFAULT_BUS_CAPACITY};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: String,
    pub version: String,
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub publisher: Publisher,
    pub build: BuildInfo,
    pub config_hash: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Publisher::new(BoardState::new().view(), DEFAULT_BUS_CAPACITY), None)
    }
}

impl AppState {
    pub fn new(publisher: Publisher, config_hash: Option<String>) -> Self {
        Self {
            publisher,
            build: BuildInfo {
                service: "qb-daemon".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            config_hash,
        }
    }
}

/// Seconds since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Emit a heartbeat on the bus every `interval` so idle SSE clients can
/// tell the daemon is alive.
pub fn spawn_heartbeat(bus: broadcast::Sender<BoardMsg>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BoardMsg::Heartbeat { ts_millis: ts });
        }
    })
}
