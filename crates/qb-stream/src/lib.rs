//! qb-stream
//!
//! Network edge of the board:
//! - [`sse`]: incremental `text/event-stream` framing
//! - [`client`]: the long-lived stream subscription with transport retry
//! - [`loader`]: the one-shot initial snapshot fetch
//!
//! Nothing here interprets payloads; raw `data` strings go to the board's
//! decoder.

pub mod client;
pub mod loader;
pub mod sse;

pub use client::{
    StreamClient, StreamError, StreamHandle, StreamOccurrence, StreamOptions,
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_RETRY,
};
pub use loader::{LoadError, SnapshotLoader, DEFAULT_LOAD_TIMEOUT};
pub use sse::{SseDecoder, SseFrame, DEFAULT_EVENT};
