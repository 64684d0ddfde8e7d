//! qb-schemas
//!
//! Wire types for the quiz backend's HTTP and SSE payloads.
//!
//! These mirror the backend's JSON exactly and carry no board semantics.
//! Interpretation (difficulty ranks, codepoint parsing, batch identity)
//! lives in `qb-board`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// `kanji.unicode` as sent by the backend.
///
/// The documented shape is a hex string (`"9b5a"`), but some backend builds
/// serialize the codepoint as a bare integer. Both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireUnicode {
    Hex(String),
    Codepoint(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireKanji {
    pub unicode: WireUnicode,
    pub yomi: String,
    pub kanji: String,
    /// "Easy" | "Medium" | "Hard". Kept as a string so unknown labels
    /// never fail the whole payload.
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireQuestion {
    pub index: u64,
    pub kanji: WireKanji,
    #[serde(default)]
    pub is_solved: bool,
}

/// `std::time::Duration` as serialized by serde on the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDuration {
    pub secs: u64,
    pub nanos: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireQuestionsPayload {
    pub current: Vec<WireQuestion>,
    #[serde(default)]
    pub remaining_time: WireDuration,
}

// ---------------------------------------------------------------------------
// GET /current_questions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentQuestionsResponse {
    pub current_questions: Vec<WireQuestion>,
}

// ---------------------------------------------------------------------------
// GET /sse
// ---------------------------------------------------------------------------

/// One JSON message on the backend's SSE stream.
///
/// Externally tagged, e.g. `{"Answer": {"index": 3, "is_correct": true}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SseEventPayload {
    ReloadQuestions { questions: WireQuestionsPayload },
    RemainingTimePercentage { percentage: f64 },
    Answer { index: u64, is_correct: bool },
}
