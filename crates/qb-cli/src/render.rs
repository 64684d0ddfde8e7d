//! Plain-text rendering of board views and decoded events.

use std::fmt::Write;

use qb_board::{BoardView, CardView, DecodedEvent};

/// Header line plus one line per card; the exiting overlay follows when present.
pub fn render_view(view: &BoardView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "generation={} progress={:.1} warning={} all_clear={} connection={} entering={} solved={}/{}",
        view.generation,
        view.progress,
        view.warning,
        view.all_clear,
        connection_label(view),
        view.entering,
        view.solved_count(),
        view.cards.len(),
    );
    for card in &view.cards {
        out.push_str(&render_card(card));
    }
    if !view.exiting.is_empty() {
        out.push_str("  exiting:\n");
        for card in &view.exiting {
            out.push_str(&render_card(card));
        }
    }
    out
}

fn connection_label(view: &BoardView) -> &'static str {
    match view.connection {
        qb_board::ConnectionState::Connected => "connected",
        qb_board::ConnectionState::Reconnecting => "reconnecting",
    }
}

fn render_card(card: &CardView) -> String {
    let mark = if card.is_correct { "x" } else { " " };
    let stars = "*".repeat(usize::from(card.difficulty));
    format!(
        "  [{mark}] {index:>4} {glyph} {reading} {stars}\n",
        index = card.index,
        glyph = card.glyph,
        reading = card.reading,
    )
}

/// `key=value` summary of one decoded payload.
pub fn render_decoded(event: &DecodedEvent) -> String {
    match event {
        DecodedEvent::ReloadQuestions {
            batch,
            remaining_time,
        } => format!(
            "event=reload questions={} indices={:?} remaining_ms={}",
            batch.len(),
            batch.iter().map(|q| q.index()).collect::<Vec<_>>(),
            remaining_time.as_millis()
        ),
        DecodedEvent::RemainingTimePercentage { percentage } => {
            format!("event=tick percentage={percentage}")
        }
        DecodedEvent::Answer { index, is_correct } => {
            format!("event=answer index={index} is_correct={is_correct}")
        }
    }
}
