//! qb-runtime
//!
//! Async shell around the pure board: the tokio-backed timer registry, the
//! single-owner event loop, and view publication.

pub mod bus;
pub mod runtime;
pub mod timers;

pub use bus::{BoardMsg, Publisher, DEFAULT_BUS_CAPACITY};
pub use runtime::{BoardRuntime, RuntimeHandle, SeedResult, SourceFeed, Sources};
pub use timers::TimerRegistry;
