//! All-clear detector.
//!
//! Raises the celebratory overlay when the current batch is non-empty, every
//! index is solved and the overlay is not already up. The overlay hides on
//! its own after [`ALL_CLEAR_WINDOW`]; there is no manual dismissal.
//!
//! Fires at most once per batch generation: after auto-dismissal the same
//! fully-solved batch does not raise it again. A reload while the overlay is
//! visible leaves it visible until its timer expires.

use std::time::Duration;

use crate::{Reconciler, TimerKind, TimerScheduler, TimerToken};

pub const ALL_CLEAR_WINDOW: Duration = Duration::from_millis(3000);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllClearDetector {
    dismiss_timer: Option<TimerToken>,
    fired_for: Option<u64>,
}

impl AllClearDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.dismiss_timer.is_some()
    }

    /// Generation the overlay last fired for.
    pub fn fired_for(&self) -> Option<u64> {
        self.fired_for
    }

    /// Re-evaluate against the reconciler. Returns `true` if the overlay was raised.
    pub fn evaluate(&mut self, reconciler: &Reconciler, timers: &mut dyn TimerScheduler) -> bool {
        if self.is_visible()
            || self.fired_for == Some(reconciler.generation())
            || !reconciler.is_all_solved()
        {
            return false;
        }

        self.fired_for = Some(reconciler.generation());
        self.dismiss_timer = Some(timers.start(TimerKind::AllClearDismiss, ALL_CLEAR_WINDOW));
        true
    }

    /// Handle a dismiss-timer expiry. Returns `false` for a stale token.
    pub fn on_dismiss_timer(&mut self, token: TimerToken) -> bool {
        if self.dismiss_timer == Some(token) {
            self.dismiss_timer = None;
            true
        } else {
            false
        }
    }

    pub fn teardown(&mut self, timers: &mut dyn TimerScheduler) {
        if self.dismiss_timer.take().is_some() {
            timers.cancel(TimerKind::AllClearDismiss);
        }
    }
}
