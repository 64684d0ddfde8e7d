//! Event decoder: raw SSE `data` -> typed board event.
//!
//! Total over its input. A payload that is not one of the three recognised
//! shapes decodes to `None` (or a [`DecodeError`] carrying the reason); it
//! never panics and never asks the caller to drop the connection.

use std::time::Duration;

use qb_schemas::SseEventPayload;

use crate::Batch;

/// A recognised stream message.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedEvent {
    ReloadQuestions { batch: Batch, remaining_time: Duration },
    RemainingTimePercentage { percentage: f64 },
    Answer { index: u64, is_correct: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("unrecognised payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one raw message, keeping the failure reason for logging.
pub fn try_decode(raw: &str) -> Result<DecodedEvent, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let payload: SseEventPayload = serde_json::from_str(raw)?;
    Ok(match payload {
        SseEventPayload::ReloadQuestions { questions } => DecodedEvent::ReloadQuestions {
            batch: Batch::from_wire(&questions.current),
            remaining_time: Duration::from_secs(questions.remaining_time.secs)
                .saturating_add(Duration::from_nanos(u64::from(questions.remaining_time.nanos))),
        },
        SseEventPayload::RemainingTimePercentage { percentage } => {
            DecodedEvent::RemainingTimePercentage { percentage }
        }
        SseEventPayload::Answer { index, is_correct } => DecodedEvent::Answer { index, is_correct },
    })
}

/// Decode one raw message; `None` on any malformed input.
pub fn decode(raw: &str) -> Option<DecodedEvent> {
    match try_decode(raw) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::debug!(error = %err, "discarding undecodable stream payload");
            None
        }
    }
}
