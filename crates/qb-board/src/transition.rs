//! Transition controller: entry-animation window over the reconciler.
//!
//! # State diagram
//!
//! ```text
//!            reload(b)                       reload(b)
//!   Idle ───────────────► Entering ◄──────────────────┐
//!    ▲                      │  │   cancel exit timer, │
//!    │    exit timer fires  │  │   re-snapshot, rearm │
//!    └──────────────────────┘  └──────────────────────┘
//! ```
//!
//! Every reload snapshots the batch it supersedes *at that moment*, installs
//! the new batch, resets the gauge and (re)arms one exit timer. A reload
//! during `Entering` cancels before it rearms and replaces the snapshot
//! outright, so the overlay never holds more than one prior generation and
//! never more than one exit timer is pending. Content equality between old
//! and new batch is not checked.

use std::time::Duration;

use crate::{
    Batch, CorrectnessSet, ProgressGauge, Reconciler, TimerKind, TimerScheduler, TimerToken,
};

/// Length of the entry-animation window.
pub const TRANSITION_WINDOW: Duration = Duration::from_millis(4000);

/// Frozen outgoing batch and its correctness at the moment it was superseded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionSnapshot {
    pub batch: Batch,
    pub correct: CorrectnessSet,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransitionPhase {
    #[default]
    Idle,
    Entering {
        snapshot: TransitionSnapshot,
        exit_timer: TimerToken,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionController {
    phase: TransitionPhase,
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &TransitionPhase {
        &self.phase
    }

    pub fn is_entering(&self) -> bool {
        matches!(self.phase, TransitionPhase::Entering { .. })
    }

    pub fn snapshot(&self) -> Option<&TransitionSnapshot> {
        match &self.phase {
            TransitionPhase::Entering { snapshot, .. } => Some(snapshot),
            TransitionPhase::Idle => None,
        }
    }

    /// Install a non-empty `batch` through the animation window.
    ///
    /// The caller guarantees `batch` is non-empty.
    pub fn reload(
        &mut self,
        batch: Batch,
        reconciler: &mut Reconciler,
        gauge: &mut ProgressGauge,
        timers: &mut dyn TimerScheduler,
    ) {
        if self.is_entering() {
            timers.cancel(TimerKind::TransitionExit);
        }

        let (outgoing_batch, outgoing_correct) = reconciler.install(batch);
        gauge.reset();

        let exit_timer = timers.start(TimerKind::TransitionExit, TRANSITION_WINDOW);
        self.phase = TransitionPhase::Entering {
            snapshot: TransitionSnapshot {
                batch: outgoing_batch,
                correct: outgoing_correct,
            },
            exit_timer,
        };
    }

    /// Handle an exit-timer expiry. Returns `false` for a stale token.
    pub fn on_exit_timer(&mut self, token: TimerToken) -> bool {
        match &self.phase {
            TransitionPhase::Entering { exit_timer, .. } if *exit_timer == token => {
                self.phase = TransitionPhase::Idle;
                true
            }
            _ => false,
        }
    }

    /// Cancel the exit timer and drop any snapshot.
    pub fn teardown(&mut self, timers: &mut dyn TimerScheduler) {
        if self.is_entering() {
            timers.cancel(TimerKind::TransitionExit);
        }
        self.phase = TransitionPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Difficulty, ManualTimers, Question};

    fn batch(indices: &[u64]) -> Batch {
        Batch::new(
            indices
                .iter()
                .map(|i| Question::new(*i, "9b5a", "魚", "さかな", Difficulty::EASY))
                .collect(),
        )
    }

    #[test]
    fn rapid_reloads_keep_one_snapshot_and_one_timer() {
        let mut tc = TransitionController::new();
        let mut rec = Reconciler::new();
        let mut gauge = ProgressGauge::new();
        let mut timers = ManualTimers::new();

        tc.reload(batch(&[1]), &mut rec, &mut gauge, &mut timers);
        rec.apply_answer(1, true);
        tc.reload(batch(&[2]), &mut rec, &mut gauge, &mut timers);

        let snap = tc.snapshot().expect("entering");
        assert_eq!(snap.batch, batch(&[1]));
        assert!(snap.correct.contains(1));
        assert_eq!(timers.pending_count(), 1);
    }

    #[test]
    fn superseded_exit_timer_is_stale() {
        let mut tc = TransitionController::new();
        let mut rec = Reconciler::new();
        let mut gauge = ProgressGauge::new();
        let mut timers = ManualTimers::new();

        tc.reload(batch(&[1]), &mut rec, &mut gauge, &mut timers);
        let first = timers.pending(TimerKind::TransitionExit).unwrap();
        tc.reload(batch(&[2]), &mut rec, &mut gauge, &mut timers);

        assert!(!tc.on_exit_timer(first));
        assert!(tc.is_entering());

        let second = timers.pending(TimerKind::TransitionExit).unwrap();
        assert!(tc.on_exit_timer(second));
        assert_eq!(tc.phase(), &TransitionPhase::Idle);
    }

    #[test]
    fn teardown_cancels_exit_timer() {
        let mut tc = TransitionController::new();
        let mut rec = Reconciler::new();
        let mut gauge = ProgressGauge::new();
        let mut timers = ManualTimers::new();

        tc.reload(batch(&[1]), &mut rec, &mut gauge, &mut timers);
        tc.teardown(&mut timers);
        assert_eq!(timers.pending_count(), 0);
        assert!(tc.snapshot().is_none());
    }
}
