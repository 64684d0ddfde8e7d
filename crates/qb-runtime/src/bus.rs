//! View publication: latest view behind a lock plus a broadcast bus.

use std::sync::Arc;

use qb_board::BoardView;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Messages broadcast to subscribers (SSE clients, the CLI watcher).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardMsg {
    Heartbeat { ts_millis: i64 },
    View(BoardView),
    LogLine { level: String, msg: String },
}

/// Cloneable handle to the published view and the bus.
#[derive(Clone, Debug)]
pub struct Publisher {
    view: Arc<RwLock<BoardView>>,
    bus: broadcast::Sender<BoardMsg>,
}

impl Publisher {
    pub fn new(initial: BoardView, bus_capacity: usize) -> Self {
        let (bus, _rx) = broadcast::channel(bus_capacity.max(1));
        Self {
            view: Arc::new(RwLock::new(initial)),
            bus,
        }
    }

    pub fn view(&self) -> Arc<RwLock<BoardView>> {
        Arc::clone(&self.view)
    }

    pub async fn latest(&self) -> BoardView {
        self.view.read().await.clone()
    }

    pub fn bus(&self) -> broadcast::Sender<BoardMsg> {
        self.bus.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardMsg> {
        self.bus.subscribe()
    }

    /// Store and broadcast. The lock is released before broadcasting.
    pub async fn publish_view(&self, view: BoardView) {
        *self.view.write().await = view.clone();
        // No subscribers is fine.
        let _ = self.bus.send(BoardMsg::View(view));
    }

    pub fn log_line(&self, level: &str, msg: impl Into<String>) {
        let _ = self.bus.send(BoardMsg::LogLine {
            level: level.to_string(),
            msg: msg.into(),
        });
    }
}
