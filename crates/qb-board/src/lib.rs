//! qb-board
//!
//! Real-time reconciliation core for the live quiz board.
//!
//! Architectural decisions:
//! - One reducer (`BoardState::apply`) absorbs every input: seed, reload,
//!   tick, answer, timer expiry, connection change.
//! - Timers are requested through the [`TimerScheduler`] seam; the reducer
//!   never sleeps and never reads a clock.
//! - A fired timer whose token is no longer armed is stale and ignored.
//! - Nothing here is fatal: bad input degrades to "keep the last good view".
//!
//! Pure deterministic logic. No IO, no wall-clock.

mod all_clear;
mod batch;
mod decoder;
mod gauge;
mod question;
mod reconciler;
mod state;
mod timers;
mod transition;
mod view;

pub use all_clear::{AllClearDetector, ALL_CLEAR_WINDOW};
pub use batch::{Batch, CorrectnessSet};
pub use decoder::{decode, try_decode, DecodeError, DecodedEvent};
pub use gauge::{ProgressGauge, TickOutcome, FULL_PERCENTAGE, WARNING_PERCENTAGE};
pub use question::{parse_codepoint, Codepoint, Difficulty, Question};
pub use reconciler::{AnswerOutcome, Reconciler};
pub use state::{Applied, ApplyReason, BoardEvent, BoardState, ConnectionState, Seed};
pub use timers::{ManualTimers, TimerKind, TimerScheduler, TimerToken};
pub use transition::{TransitionController, TransitionPhase, TransitionSnapshot, TRANSITION_WINDOW};
pub use view::{BoardView, CardView};
