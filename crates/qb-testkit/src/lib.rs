//! qb-testkit
//!
//! Shared fixtures for scenario tests: wire questions, raw SSE payloads,
//! SSE response bodies and ready-made board events.
//!
//! Only `tests/` directories should depend on this crate. Unit tests inside
//! `qb-board/src` must not, or they would see a second copy of its types.

use std::time::Duration;

use qb_board::{Batch, BoardEvent, DecodedEvent, Seed};
use qb_schemas::{
    CurrentQuestionsResponse, SseEventPayload, WireDuration, WireKanji, WireQuestion,
    WireQuestionsPayload, WireUnicode,
};

/// (codepoint hex, glyph, reading, difficulty) for fish-radical kanji.
const FISH: &[(&str, &str, &str, &str)] = &[
    ("9b5a", "魚", "さかな", "Easy"),
    ("9bad", "鮭", "さけ", "Easy"),
    ("9baa", "鮪", "まぐろ", "Medium"),
    ("9c2f", "鰯", "いわし", "Medium"),
    ("9bdb", "鯛", "たい", "Easy"),
    ("9c3b", "鰻", "うなぎ", "Medium"),
    ("9c48", "鱈", "たら", "Hard"),
    ("9bd6", "鯖", "さば", "Hard"),
    ("9c39", "鰹", "かつお", "Hard"),
    ("9bc9", "鯉", "こい", "Easy"),
];

// ---------------------------------------------------------------------------
// Wire fixtures
// ---------------------------------------------------------------------------

/// A wire question whose kanji is picked from a fixed table by `index`.
pub fn wire_question(index: u64) -> WireQuestion {
    let (hex, glyph, yomi, difficulty) = FISH[(index as usize) % FISH.len()];
    wire_question_with(index, hex, glyph, yomi, difficulty)
}

pub fn wire_question_with(
    index: u64,
    hex: &str,
    glyph: &str,
    yomi: &str,
    difficulty: &str,
) -> WireQuestion {
    WireQuestion {
        index,
        kanji: WireKanji {
            unicode: WireUnicode::Hex(hex.to_string()),
            yomi: yomi.to_string(),
            kanji: glyph.to_string(),
            difficulty: difficulty.to_string(),
        },
        is_solved: false,
    }
}

pub fn wire_batch(indices: &[u64]) -> Vec<WireQuestion> {
    indices.iter().copied().map(wire_question).collect()
}

pub fn batch(indices: &[u64]) -> Batch {
    Batch::from_wire(&wire_batch(indices))
}

// ---------------------------------------------------------------------------
// Raw payloads (exact backend JSON)
// ---------------------------------------------------------------------------

fn to_json(payload: &SseEventPayload) -> String {
    serde_json::to_string(payload).expect("fixture payload serializes")
}

pub fn reload_payload(indices: &[u64]) -> String {
    reload_payload_with(wire_batch(indices), Duration::from_secs(60))
}

pub fn reload_payload_with(current: Vec<WireQuestion>, remaining: Duration) -> String {
    to_json(&SseEventPayload::ReloadQuestions {
        questions: WireQuestionsPayload {
            current,
            remaining_time: WireDuration {
                secs: remaining.as_secs(),
                nanos: remaining.subsec_nanos(),
            },
        },
    })
}

pub fn tick_payload(percentage: f64) -> String {
    to_json(&SseEventPayload::RemainingTimePercentage { percentage })
}

pub fn answer_payload(index: u64, is_correct: bool) -> String {
    to_json(&SseEventPayload::Answer { index, is_correct })
}

/// Body of `GET /current_questions`.
pub fn current_questions_body(questions: Vec<WireQuestion>) -> String {
    serde_json::to_string(&CurrentQuestionsResponse {
        current_questions: questions,
    })
    .expect("fixture body serializes")
}

/// A `text/event-stream` body carrying each payload as one unnamed event.
pub fn sse_body(payloads: &[String]) -> String {
    let mut body = String::from(": connected\n\n");
    for p in payloads {
        body.push_str("data: ");
        body.push_str(p);
        body.push_str("\n\n");
    }
    body
}

// ---------------------------------------------------------------------------
// Board events
// ---------------------------------------------------------------------------

pub fn reload_event(indices: &[u64]) -> BoardEvent {
    BoardEvent::Decoded(DecodedEvent::ReloadQuestions {
        batch: batch(indices),
        remaining_time: Duration::from_secs(60),
    })
}

pub fn answer_event(index: u64, is_correct: bool) -> BoardEvent {
    BoardEvent::Decoded(DecodedEvent::Answer { index, is_correct })
}

pub fn tick_event(percentage: f64) -> BoardEvent {
    BoardEvent::Decoded(DecodedEvent::RemainingTimePercentage { percentage })
}

pub fn seed_event(indices: &[u64]) -> BoardEvent {
    BoardEvent::Seed(Seed::from_wire(&wire_batch(indices)))
}
