use std::collections::BTreeSet;

use qb_schemas::WireQuestion;

use crate::Question;

/// Ordered question set. Replaced wholesale, never mutated in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    questions: Vec<Question>,
}

impl Batch {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_wire(wire: &[WireQuestion]) -> Self {
        Self::new(wire.iter().map(Question::from_wire).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn contains_index(&self, index: u64) -> bool {
        self.questions.iter().any(|q| q.index() == index)
    }

    pub fn indices(&self) -> BTreeSet<u64> {
        self.questions.iter().map(Question::index).collect()
    }
}

/// Indices of the current batch confirmed correct.
///
/// Only [`Reconciler`](crate::Reconciler) inserts, and only indices present
/// in its current batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrectnessSet {
    solved: BTreeSet<u64>,
}

impl CorrectnessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the index was not already present.
    pub(crate) fn insert(&mut self, index: u64) -> bool {
        self.solved.insert(index)
    }

    pub fn contains(&self, index: u64) -> bool {
        self.solved.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.solved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solved.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.solved.iter().copied()
    }

    /// `true` when `batch` is non-empty and every one of its indices is solved.
    pub fn covers(&self, batch: &Batch) -> bool {
        !batch.is_empty() && batch.iter().all(|q| self.contains(q.index()))
    }
}
