//! Response types for the daemon's HTTP endpoints.

use qb_board::BoardView;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub daemon_uptime_secs: u64,
    /// Hash of the effective layered config, when started from one.
    pub config_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// /v1/board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardResponse {
    pub daemon_uptime_secs: u64,
    pub view: BoardView,
}
