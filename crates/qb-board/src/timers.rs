//! Timer scheduler seam.
//!
//! The board asks a [`TimerScheduler`] to arm or cancel at most one timer per
//! [`TimerKind`]. Expiry comes back as `BoardEvent::TimerFired(token)`; the
//! board compares the token against the one it armed, so a completion that
//! was already in flight when its timer got cancelled is recognised as stale.
//!
//! [`ManualTimers`] is a deterministic implementation with a virtual clock.
//! The tokio-backed registry lives in `qb-runtime`.

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Ends the entry-animation window and drops the transition snapshot.
    TransitionExit,
    /// Hides the all-clear overlay.
    AllClearDismiss,
}

/// Identifies one arming of a timer. `seq` is unique per scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub seq: u64,
}

pub trait TimerScheduler {
    /// Arm `kind` to fire after `after`, replacing any pending timer of that kind.
    fn start(&mut self, kind: TimerKind, after: Duration) -> TimerToken;

    /// Disarm `kind`. No-op when nothing is pending.
    fn cancel(&mut self, kind: TimerKind);
}

// ---------------------------------------------------------------------------
// ManualTimers
// ---------------------------------------------------------------------------

/// Virtual-clock scheduler for deterministic tests and replays.
#[derive(Clone, Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<TimerKind, (Duration, TimerToken)>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since construction.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self, kind: TimerKind) -> Option<TimerToken> {
        self.pending.get(&kind).map(|(_, token)| *token)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the virtual clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerToken> {
        let (kind, deadline, token) = self
            .pending
            .iter()
            .map(|(kind, (deadline, token))| (*kind, *deadline, *token))
            .filter(|(_, deadline, _)| *deadline <= until)
            .min_by_key(|(_, deadline, token)| (*deadline, token.seq))?;

        self.pending.remove(&kind);
        self.now = self.now.max(deadline);
        Some(token)
    }

    /// Move the virtual clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl TimerScheduler for ManualTimers {
    fn start(&mut self, kind: TimerKind, after: Duration) -> TimerToken {
        self.next_seq += 1;
        let token = TimerToken {
            kind,
            seq: self.next_seq,
        };
        self.pending.insert(kind, (self.now + after, token));
        token
    }

    fn cancel(&mut self, kind: TimerKind) {
        self.pending.remove(&kind);
    }
}
