//! Incremental `text/event-stream` decoder.
//!
//! Bytes are pushed as they arrive; a frame may be split across any number
//! of chunks and a chunk may carry several frames. Lines end in LF, CR or
//! CRLF (a CRLF split across two chunks counts once). A leading UTF-8 BOM is
//! dropped. `:` lines are comments (keep-alives) and ignored.
//!
//! Dispatch happens on a blank line. A frame with no `data:` lines is not
//! dispatched. Multiple `data:` lines are joined with `\n`.

use std::time::Duration;

/// Event type of frames without an `event:` field.
pub const DEFAULT_EVENT: &str = "message";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    /// Last event id in effect when this frame was dispatched.
    pub id: Option<String>,
}

impl SseFrame {
    /// Unnamed or explicitly `message` events.
    pub fn is_message(&self) -> bool {
        self.event == DEFAULT_EVENT
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    /// Previous byte was CR; swallow an immediately following LF.
    after_cr: bool,
    at_stream_start: bool,
    data: String,
    has_data: bool,
    event: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            at_stream_start: true,
            ..Self::default()
        }
    }

    /// Id to send as `Last-Event-ID` on reconnect. Survives [`reset`](Self::reset).
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay requested by the server. Survives [`reset`](Self::reset).
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Drop any partial line or frame before reading a new connection.
    pub fn reset(&mut self) {
        self.line.clear();
        self.after_cr = false;
        self.at_stream_start = true;
        self.data.clear();
        self.has_data = false;
        self.event = None;
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for &b in chunk {
            if self.after_cr {
                self.after_cr = false;
                if b == b'\n' {
                    continue;
                }
            }
            match b {
                b'\n' => self.end_line(&mut frames),
                b'\r' => {
                    self.after_cr = true;
                    self.end_line(&mut frames);
                }
                _ => self.line.push(b),
            }
        }
        frames
    }

    fn end_line(&mut self, frames: &mut Vec<SseFrame>) {
        let raw = std::mem::take(&mut self.line);
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        if self.at_stream_start {
            self.at_stream_start = false;
            if let Some(stripped) = line.strip_prefix('\u{feff}') {
                line = stripped.to_string();
            }
        }

        if line.is_empty() {
            if let Some(frame) = self.dispatch() {
                frames.push(frame);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line.as_str(), ""),
        };
        match field {
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_string()),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|c| c.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_of(frames: &[SseFrame]) -> Vec<&str> {
        frames.iter().map(|f| f.data.as_str()).collect()
    }

    #[test]
    fn single_frame() {
        let mut d = SseDecoder::new();
        let frames = d.push(b"data: {\"a\":1}\n\n");
        assert_eq!(data_of(&frames), vec!["{\"a\":1}"]);
        assert!(frames[0].is_message());
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"da").is_empty());
        assert!(d.push(b"ta: hel").is_empty());
        assert!(d.push(b"lo\n").is_empty());
        assert_eq!(data_of(&d.push(b"\n")), vec!["hello"]);
    }

    #[test]
    fn crlf_split_between_chunks_is_one_line_end() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"data: x\r").is_empty());
        // The LF completes the CRLF; the next CR is the blank line.
        assert_eq!(data_of(&d.push(b"\n\r\n")), vec!["x"]);
    }

    #[test]
    fn bare_cr_line_endings() {
        let mut d = SseDecoder::new();
        assert_eq!(data_of(&d.push(b"data: a\r\rdata: b\r\r")), vec!["a", "b"]);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut d = SseDecoder::new();
        let frames = d.push(b"data: one\ndata:two\ndata\n\n");
        assert_eq!(data_of(&frames), vec!["one\ntwo\n"]);
    }

    #[test]
    fn comments_and_empty_frames_are_skipped() {
        let mut d = SseDecoder::new();
        let frames = d.push(b": keep-alive\n\nevent: ping\n\ndata: real\n\n");
        assert_eq!(data_of(&frames), vec!["real"]);
        assert!(frames[0].is_message(), "event type resets after an empty frame");
    }

    #[test]
    fn named_events_keep_their_type() {
        let mut d = SseDecoder::new();
        let frames = d.push(b"event: heartbeat\ndata: {}\n\n");
        assert_eq!(frames[0].event, "heartbeat");
        assert!(!frames[0].is_message());
    }

    #[test]
    fn bom_is_stripped_once() {
        let mut d = SseDecoder::new();
        let mut bytes = "\u{feff}data: a\n\n".as_bytes().to_vec();
        bytes.extend_from_slice("data: \u{feff}b\n\n".as_bytes());
        let frames = d.push(&bytes);
        assert_eq!(frames[0].data, "a");
        assert_eq!(frames[1].data, "\u{feff}b");
    }

    #[test]
    fn id_and_retry_survive_reset() {
        let mut d = SseDecoder::new();
        let frames = d.push(b"id: 42\nretry: 750\ndata: x\n\ndata: partial");
        assert_eq!(frames[0].id.as_deref(), Some("42"));
        d.reset();
        assert_eq!(d.last_event_id(), Some("42"));
        assert_eq!(d.retry(), Some(Duration::from_millis(750)));
        // The partial frame from the dead connection is gone.
        assert!(d.push(b"\n\n").is_empty());
    }

    #[test]
    fn invalid_retry_is_ignored() {
        let mut d = SseDecoder::new();
        d.push(b"retry: 1.5\n\nretry: soon\n\n");
        assert_eq!(d.retry(), None);
    }
}
