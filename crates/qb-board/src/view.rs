//! Render-facing snapshot of the board.
//!
//! Produced after every applied event, so a batch and the gauge reset that
//! came with it are always observed together.

use serde::{Deserialize, Serialize};

use crate::{Batch, ConnectionState, CorrectnessSet, Question};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardView {
    /// Stable render key; overlay cards carry an `-exiting` suffix.
    pub key: String,
    /// Position in its batch (drives staggered animation).
    pub position: usize,
    pub index: u64,
    pub codepoint: u64,
    pub codepoint_is_placeholder: bool,
    pub glyph: String,
    pub reading: String,
    pub difficulty: u8,
    pub is_correct: bool,
}

impl CardView {
    fn from_question(question: &Question, position: usize, is_correct: bool, exiting: bool) -> Self {
        let mut key = question.display_key();
        if exiting {
            key.push_str("-exiting");
        }
        Self {
            key,
            position,
            index: question.index(),
            codepoint: question.codepoint().value(),
            codepoint_is_placeholder: question.codepoint().is_placeholder(),
            glyph: question.glyph().to_string(),
            reading: question.reading().to_string(),
            difficulty: question.difficulty().rank(),
            is_correct,
        }
    }

    pub(crate) fn cards(batch: &Batch, correct: &CorrectnessSet, exiting: bool) -> Vec<CardView> {
        batch
            .iter()
            .enumerate()
            .map(|(pos, q)| Self::from_question(q, pos, correct.contains(q.index()), exiting))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub generation: u64,
    pub cards: Vec<CardView>,
    /// Entry animation running for `cards`.
    pub entering: bool,
    /// Outgoing batch rendered as an overlay during the entry window.
    pub exiting: Vec<CardView>,
    pub progress: f64,
    pub warning: bool,
    pub all_clear: bool,
    pub connection: ConnectionState,
}

impl BoardView {
    pub fn solved_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_correct).count()
    }
}
