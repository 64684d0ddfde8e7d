//! Tokio-clock implementation of the board's timer seam.
//!
//! Holds at most one deadline per [`TimerKind`]. The run loop sleeps until
//! [`TimerRegistry::next_due`] and then [`take`](TimerRegistry::take)s the
//! token; a token that was cancelled or replaced in the meantime is not
//! taken and never reaches the board.

use std::collections::BTreeMap;
use std::time::Duration;

use qb_board::{TimerKind, TimerScheduler, TimerToken};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
pub struct TimerRegistry {
    next_seq: u64,
    pending: BTreeMap<TimerKind, (Instant, TimerToken)>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest pending deadline and its token.
    pub fn next_due(&self) -> Option<(Instant, TimerToken)> {
        self.pending
            .values()
            .copied()
            .min_by_key(|(deadline, token)| (*deadline, token.seq))
    }

    /// Remove `token` if it is still the armed one for its kind.
    pub fn take(&mut self, token: TimerToken) -> bool {
        match self.pending.get(&token.kind) {
            Some((_, armed)) if *armed == token => {
                self.pending.remove(&token.kind);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl TimerScheduler for TimerRegistry {
    fn start(&mut self, kind: TimerKind, after: Duration) -> TimerToken {
        self.next_seq += 1;
        let token = TimerToken {
            kind,
            seq: self.next_seq,
        };
        self.pending.insert(kind, (Instant::now() + after, token));
        debug!(?kind, seq = token.seq, after_ms = after.as_millis() as u64, "timer armed");
        token
    }

    fn cancel(&mut self, kind: TimerKind) {
        if let Some((_, token)) = self.pending.remove(&kind) {
            debug!(?kind, seq = token.seq, "timer cancelled");
        }
    }
}
