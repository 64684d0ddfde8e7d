//! Question-set reconciler.
//!
//! # Invariants
//!
//! - **Correctness is a subset of the batch**: only indices present in the
//!   current batch are ever inserted.
//! - **Install clears correctness**: every installed batch starts unsolved
//!   (a seed may pre-solve indices the backend already reports solved).
//! - **Generations only grow**: each install bumps `generation`; `0` means
//!   nothing has been installed yet.
//!
//! Reload handling (the empty-batch guard and the entry animation) sits in
//! [`BoardState`](crate::BoardState) and
//! [`TransitionController`](crate::TransitionController); this type only owns
//! the authoritative batch and its correctness set.

use std::collections::BTreeSet;

use crate::{Batch, CorrectnessSet};

/// What an `Answer` event did to the correctness set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded,
    AlreadyRecorded,
    /// `is_correct == false`; only positive confirmations are tracked.
    IgnoredIncorrect,
    /// Index not in the current batch (usually an answer for a batch that
    /// has already been superseded).
    IgnoredUnknownIndex,
}

impl AnswerOutcome {
    pub fn changed(self) -> bool {
        matches!(self, AnswerOutcome::Recorded)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciler {
    batch: Batch,
    correct: CorrectnessSet,
    generation: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn correct(&self) -> &CorrectnessSet {
        &self.correct
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` once any batch (seed or reload) has been installed.
    pub fn is_seeded(&self) -> bool {
        self.generation > 0
    }

    pub fn is_all_solved(&self) -> bool {
        self.correct.covers(&self.batch)
    }

    pub fn apply_answer(&mut self, index: u64, is_correct: bool) -> AnswerOutcome {
        if !is_correct {
            return AnswerOutcome::IgnoredIncorrect;
        }
        if !self.batch.contains_index(index) {
            return AnswerOutcome::IgnoredUnknownIndex;
        }
        if self.correct.insert(index) {
            AnswerOutcome::Recorded
        } else {
            AnswerOutcome::AlreadyRecorded
        }
    }

    /// Install `batch` as current, returning the superseded pair.
    pub(crate) fn install(&mut self, batch: Batch) -> (Batch, CorrectnessSet) {
        self.generation += 1;
        let outgoing_batch = std::mem::replace(&mut self.batch, batch);
        let outgoing_correct = std::mem::take(&mut self.correct);
        (outgoing_batch, outgoing_correct)
    }

    /// Install the initial snapshot, pre-solving `solved` indices that belong
    /// to `batch`.
    pub(crate) fn seed(&mut self, batch: Batch, solved: &BTreeSet<u64>) {
        self.install(batch);
        let indices = self.batch.indices();
        for index in solved.intersection(&indices) {
            self.correct.insert(*index);
        }
    }
}
