//! Scenario: answers, cross-generation races and the all-clear overlay.

use std::time::Duration;

use qb_board::*;
use qb_testkit::{answer_event, reload_event, seed_event};

fn settled(indices: &[u64]) -> (BoardState, ManualTimers) {
    let mut st = BoardState::new();
    let mut timers = ManualTimers::new();
    st.apply(reload_event(indices), &mut timers);
    st.advance(&mut timers, TRANSITION_WINDOW);
    (st, timers)
}

#[test]
fn solving_every_question_raises_and_auto_dismisses_all_clear() {
    let (mut st, mut timers) = settled(&[1, 2]);

    let a = st.apply(answer_event(1, true), &mut timers);
    assert_eq!(a.reason, ApplyReason::Answer(AnswerOutcome::Recorded));
    assert!(!a.all_clear_raised);
    assert_eq!(st.reconciler().correct().iter().collect::<Vec<_>>(), vec![1]);
    assert!(!st.view().all_clear);

    let b = st.apply(answer_event(2, true), &mut timers);
    assert!(b.all_clear_raised);
    assert_eq!(
        st.reconciler().correct().iter().collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(st.view().all_clear);

    st.advance(&mut timers, Duration::from_millis(2999));
    assert!(st.view().all_clear);
    st.advance(&mut timers, Duration::from_millis(1));
    assert!(!st.view().all_clear);
}

#[test]
fn all_clear_does_not_refire_for_same_batch() {
    let (mut st, mut timers) = settled(&[1]);

    st.apply(answer_event(1, true), &mut timers);
    st.advance(&mut timers, ALL_CLEAR_WINDOW);
    assert!(!st.view().all_clear);

    // Duplicate confirmation and further time do not re-raise it.
    let dup = st.apply(answer_event(1, true), &mut timers);
    assert_eq!(dup.reason, ApplyReason::Answer(AnswerOutcome::AlreadyRecorded));
    st.advance(&mut timers, Duration::from_secs(30));
    assert!(!st.view().all_clear);
    assert_eq!(timers.pending_count(), 0);
}

#[test]
fn reload_during_all_clear_installs_new_batch_and_keeps_overlay() {
    let (mut st, mut timers) = settled(&[1, 2]);
    st.apply(answer_event(1, true), &mut timers);
    st.apply(answer_event(2, true), &mut timers);
    assert!(st.view().all_clear);

    st.advance(&mut timers, Duration::from_millis(1000));
    st.apply(reload_event(&[3]), &mut timers);

    assert_eq!(st.reconciler().batch().indices().into_iter().collect::<Vec<_>>(), vec![3]);
    assert!(st.reconciler().correct().is_empty());
    // Reload does not forcibly hide the overlay; its own timer does.
    assert!(st.view().all_clear);

    st.advance(&mut timers, Duration::from_millis(2000));
    assert!(!st.view().all_clear);

    // The new batch raises it again only once independently solved.
    let raised = st.apply(answer_event(3, true), &mut timers);
    assert!(raised.all_clear_raised);
}

#[test]
fn new_batch_solved_while_overlay_up_fires_after_dismissal() {
    let (mut st, mut timers) = settled(&[1]);
    st.apply(answer_event(1, true), &mut timers);
    st.apply(reload_event(&[2]), &mut timers);
    st.apply(answer_event(2, true), &mut timers);
    assert!(st.view().all_clear, "still the first overlay");

    // First overlay hides; the detector re-evaluates and fires for [2].
    st.advance(&mut timers, ALL_CLEAR_WINDOW);
    assert!(st.view().all_clear);
    assert_eq!(st.all_clear().fired_for(), Some(st.reconciler().generation()));

    st.advance(&mut timers, ALL_CLEAR_WINDOW);
    assert!(!st.view().all_clear);
}

#[test]
fn unknown_index_answer_is_ignored() {
    let (mut st, mut timers) = settled(&[1, 2]);
    st.apply(answer_event(1, true), &mut timers);

    let applied = st.apply(answer_event(99, true), &mut timers);
    assert_eq!(
        applied.reason,
        ApplyReason::Answer(AnswerOutcome::IgnoredUnknownIndex)
    );
    assert!(!applied.changed);
    assert_eq!(st.reconciler().correct().iter().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn answer_for_superseded_batch_is_ignored() {
    let (mut st, mut timers) = settled(&[10, 11]);
    st.apply(reload_event(&[20, 21]), &mut timers);

    let late = st.apply(answer_event(10, true), &mut timers);
    assert_eq!(late.reason, ApplyReason::Answer(AnswerOutcome::IgnoredUnknownIndex));
    // The frozen snapshot is not touched either.
    assert!(st.transition().snapshot().unwrap().correct.is_empty());
}

#[test]
fn incorrect_answers_are_not_tracked() {
    let (mut st, mut timers) = settled(&[1]);
    let applied = st.apply(answer_event(1, false), &mut timers);
    assert_eq!(applied.reason, ApplyReason::Answer(AnswerOutcome::IgnoredIncorrect));
    assert!(st.reconciler().correct().is_empty());
}

#[test]
fn seed_with_every_question_solved_raises_all_clear() {
    let mut st = BoardState::new();
    let mut timers = ManualTimers::new();

    let mut wire = qb_testkit::wire_batch(&[1, 2]);
    for q in wire.iter_mut() {
        q.is_solved = true;
    }
    let applied = st.apply(BoardEvent::Seed(Seed::from_wire(&wire)), &mut timers);
    assert_eq!(applied.reason, ApplyReason::Seeded);
    assert!(applied.all_clear_raised);
    assert!(!st.transition().is_entering(), "seed bypasses the animation");

    // Sanity: a plain seed leaves everything unsolved.
    let mut other = BoardState::new();
    other.apply(seed_event(&[1, 2]), &mut timers);
    assert!(other.reconciler().correct().is_empty());
}
