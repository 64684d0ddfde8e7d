//! The board reducer.
//!
//! [`BoardState`] is the single mutable owner of every canonical field:
//! current batch, correctness, transition snapshot, gauge, overlay and
//! connection state. [`BoardState::apply`] folds one [`BoardEvent`] into it
//! and re-runs the all-clear detector afterwards; callers feed events one at
//! a time, in delivery order.

use std::collections::BTreeSet;
use std::time::Duration;

use qb_schemas::WireQuestion;
use serde::{Deserialize, Serialize};

use crate::view::CardView;
use crate::{
    AllClearDetector, AnswerOutcome, Batch, BoardView, DecodedEvent, ManualTimers, ProgressGauge,
    Reconciler, TickOutcome, TimerKind, TimerScheduler, TimerToken, TransitionController,
};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Connected,
    Reconnecting,
}

/// The initial snapshot fetched before the first stream event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Seed {
    pub batch: Batch,
    /// Indices the backend already reports solved.
    pub solved: BTreeSet<u64>,
}

impl Seed {
    pub fn from_wire(questions: &[WireQuestion]) -> Self {
        Self {
            batch: Batch::from_wire(questions),
            solved: questions
                .iter()
                .filter(|q| q.is_solved)
                .map(|q| q.index)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoardEvent {
    Seed(Seed),
    Decoded(DecodedEvent),
    TimerFired(TimerToken),
    Connection(ConnectionState),
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyReason {
    Seeded,
    /// A reload (stream) already installed a batch; the seed is stale.
    SeedSuperseded,
    SeedEmpty,
    Reloaded,
    /// Empty reload payloads never blank a valid display.
    ReloadEmptyIgnored,
    ProgressSet,
    /// Tick equal to the current value after clamping.
    ProgressUnchanged,
    ProgressRejected,
    Answer(AnswerOutcome),
    TransitionEnded,
    AllClearDismissed,
    StaleTimer,
    ConnectionChanged,
    ConnectionUnchanged,
}

/// Result of one [`BoardState::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    pub reason: ApplyReason,
    /// The rendered view differs from before this event.
    pub changed: bool,
    /// The all-clear overlay was raised by this event.
    pub all_clear_raised: bool,
}

impl Applied {
    fn new(reason: ApplyReason, changed: bool) -> Self {
        Self {
            reason,
            changed,
            all_clear_raised: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BoardState
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct BoardState {
    reconciler: Reconciler,
    transition: TransitionController,
    gauge: ProgressGauge,
    all_clear: AllClearDetector,
    connection: ConnectionState,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    pub fn gauge(&self) -> &ProgressGauge {
        &self.gauge
    }

    pub fn all_clear(&self) -> &AllClearDetector {
        &self.all_clear
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn apply(&mut self, event: BoardEvent, timers: &mut dyn TimerScheduler) -> Applied {
        let mut applied = match event {
            BoardEvent::Seed(seed) => self.apply_seed(seed),
            BoardEvent::Decoded(DecodedEvent::ReloadQuestions { batch, .. }) => {
                self.apply_reload(batch, timers)
            }
            BoardEvent::Decoded(DecodedEvent::RemainingTimePercentage { percentage }) => {
                match self.gauge.apply_tick(percentage) {
                    TickOutcome::Set => Applied::new(ApplyReason::ProgressSet, true),
                    TickOutcome::Unchanged => Applied::new(ApplyReason::ProgressUnchanged, false),
                    TickOutcome::Rejected => Applied::new(ApplyReason::ProgressRejected, false),
                }
            }
            BoardEvent::Decoded(DecodedEvent::Answer { index, is_correct }) => {
                let outcome = self.reconciler.apply_answer(index, is_correct);
                Applied::new(ApplyReason::Answer(outcome), outcome.changed())
            }
            BoardEvent::TimerFired(token) => self.apply_timer(token),
            BoardEvent::Connection(next) => {
                if self.connection == next {
                    Applied::new(ApplyReason::ConnectionUnchanged, false)
                } else {
                    self.connection = next;
                    Applied::new(ApplyReason::ConnectionChanged, true)
                }
            }
        };

        if self.all_clear.evaluate(&self.reconciler, timers) {
            applied.changed = true;
            applied.all_clear_raised = true;
        }
        applied
    }

    /// Seed from the initial snapshot, bypassing the transition window.
    fn apply_seed(&mut self, seed: Seed) -> Applied {
        if self.reconciler.is_seeded() {
            return Applied::new(ApplyReason::SeedSuperseded, false);
        }
        if seed.batch.is_empty() {
            return Applied::new(ApplyReason::SeedEmpty, false);
        }
        self.reconciler.seed(seed.batch, &seed.solved);
        self.gauge.reset();
        Applied::new(ApplyReason::Seeded, true)
    }

    fn apply_reload(&mut self, batch: Batch, timers: &mut dyn TimerScheduler) -> Applied {
        if batch.is_empty() {
            return Applied::new(ApplyReason::ReloadEmptyIgnored, false);
        }
        self.transition
            .reload(batch, &mut self.reconciler, &mut self.gauge, timers);
        Applied::new(ApplyReason::Reloaded, true)
    }

    fn apply_timer(&mut self, token: TimerToken) -> Applied {
        let (fired, reason) = match token.kind {
            TimerKind::TransitionExit => (
                self.transition.on_exit_timer(token),
                ApplyReason::TransitionEnded,
            ),
            TimerKind::AllClearDismiss => (
                self.all_clear.on_dismiss_timer(token),
                ApplyReason::AllClearDismissed,
            ),
        };
        if fired {
            Applied::new(reason, true)
        } else {
            Applied::new(ApplyReason::StaleTimer, false)
        }
    }

    /// Cancel every pending timer. The state stays readable afterwards.
    pub fn teardown(&mut self, timers: &mut dyn TimerScheduler) {
        self.transition.teardown(timers);
        self.all_clear.teardown(timers);
    }

    /// Drive [`ManualTimers`] forward by `by`, applying each expiry in
    /// deadline order. Returns how many timers fired.
    pub fn advance(&mut self, timers: &mut ManualTimers, by: Duration) -> usize {
        let until = timers.now() + by;
        let mut fired = 0;
        while let Some(token) = timers.pop_due(until) {
            self.apply(BoardEvent::TimerFired(token), timers);
            fired += 1;
        }
        timers.set_now(until);
        fired
    }

    pub fn view(&self) -> BoardView {
        let exiting = match self.transition.snapshot() {
            Some(snap) => CardView::cards(&snap.batch, &snap.correct, true),
            None => Vec::new(),
        };
        BoardView {
            generation: self.reconciler.generation(),
            cards: CardView::cards(self.reconciler.batch(), self.reconciler.correct(), false),
            entering: self.transition.is_entering(),
            exiting,
            progress: self.gauge.percentage(),
            warning: self.gauge.is_warning(),
            all_clear: self.all_clear.is_visible(),
            connection: self.connection,
        }
    }
}
