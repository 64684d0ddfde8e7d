//! Question model and the wire -> board mapping.
//!
//! A [`Question`] is immutable once built. The mapping from
//! [`WireQuestion`] never fails: unknown difficulty labels rank as 1 and an
//! unparsable `kanji.unicode` falls back to a placeholder keyed on `index`.

use qb_schemas::{WireQuestion, WireUnicode};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Difficulty rank in `1..=3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const EASY: Difficulty = Difficulty(1);
    pub const MEDIUM: Difficulty = Difficulty(2);
    pub const HARD: Difficulty = Difficulty(3);

    /// `Easy -> 1`, `Medium -> 2`, `Hard -> 3`; anything else ranks 1.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Easy" => Self::EASY,
            "Medium" => Self::MEDIUM,
            "Hard" => Self::HARD,
            _ => Self::EASY,
        }
    }

    pub fn rank(self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Codepoint
// ---------------------------------------------------------------------------

/// The glyph's codepoint, or a placeholder when the backend sent something
/// that does not parse.
///
/// A placeholder is only good for keying a card; it must never be rendered
/// as a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codepoint {
    Glyph(u32),
    Placeholder(u64),
}

impl Codepoint {
    /// Numeric value used for display keys (codepoint or placeholder index).
    pub fn value(self) -> u64 {
        match self {
            Codepoint::Glyph(cp) => u64::from(cp),
            Codepoint::Placeholder(index) => index,
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, Codepoint::Placeholder(_))
    }

    /// The renderable character, if this is a real scalar value.
    pub fn as_char(self) -> Option<char> {
        match self {
            Codepoint::Glyph(cp) => char::from_u32(cp),
            Codepoint::Placeholder(_) => None,
        }
    }
}

/// Parse a base-16 codepoint string.
///
/// Leading whitespace and a `U+` / `0x` prefix are tolerated, and parsing
/// stops at the first non-hex character (`"9b5a;"` reads as `0x9b5a`).
/// Returns `None` when no hex digit leads the string or the value overflows.
pub fn parse_codepoint(raw: &str) -> Option<u32> {
    let s = raw.trim_start();
    let s = s
        .strip_prefix("U+")
        .or_else(|| s.strip_prefix("u+"))
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_hexdigit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    if end == 0 {
        return None;
    }
    u32::from_str_radix(&s[..end], 16).ok()
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    index: u64,
    codepoint: Codepoint,
    codepoint_hex: String,
    glyph: String,
    reading: String,
    difficulty: Difficulty,
}

impl Question {
    pub fn new(
        index: u64,
        codepoint_hex: impl Into<String>,
        glyph: impl Into<String>,
        reading: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        let codepoint_hex = codepoint_hex.into();
        let codepoint = match parse_codepoint(&codepoint_hex) {
            Some(cp) => Codepoint::Glyph(cp),
            None => Codepoint::Placeholder(index),
        };
        Self {
            index,
            codepoint,
            codepoint_hex,
            glyph: glyph.into(),
            reading: reading.into(),
            difficulty,
        }
    }

    pub fn from_wire(wire: &WireQuestion) -> Self {
        let difficulty = Difficulty::from_label(&wire.kanji.difficulty);
        match &wire.kanji.unicode {
            WireUnicode::Hex(hex) => Self::new(
                wire.index,
                hex.clone(),
                wire.kanji.kanji.clone(),
                wire.kanji.yomi.clone(),
                difficulty,
            ),
            WireUnicode::Codepoint(cp) => Self {
                index: wire.index,
                codepoint: Codepoint::Glyph(*cp),
                codepoint_hex: format!("{cp:x}"),
                glyph: wire.kanji.kanji.clone(),
                reading: wire.kanji.yomi.clone(),
                difficulty,
            },
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn codepoint(&self) -> Codepoint {
        self.codepoint
    }

    pub fn codepoint_hex(&self) -> &str {
        &self.codepoint_hex
    }

    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    pub fn reading(&self) -> &str {
        &self.reading
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Stable card key: `"{index}-{codepoint_hex}"`.
    pub fn display_key(&self) -> String {
        format!("{}-{}", self.index, self.codepoint_hex)
    }
}
