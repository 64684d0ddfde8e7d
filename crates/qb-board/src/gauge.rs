//! Countdown gauge.
//!
//! The server is the only timing authority: the gauge is assigned from
//! ticks and reset on batch install, never decremented locally.

pub const FULL_PERCENTAGE: f64 = 100.0;

/// At or below this the gauge renders in its warning colour.
pub const WARNING_PERCENTAGE: f64 = 20.0;

/// What a server tick did to the gauge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Set,
    /// Accepted, but the clamped value equals the current one.
    Unchanged,
    /// Non-finite; the gauge keeps its value.
    Rejected,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressGauge {
    percentage: f64,
}

impl Default for ProgressGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressGauge {
    pub fn new() -> Self {
        Self {
            percentage: FULL_PERCENTAGE,
        }
    }

    /// Assign a server tick, clamped to `[0, 100]`.
    ///
    /// Non-finite values are rejected and leave the gauge unchanged.
    pub fn apply_tick(&mut self, percentage: f64) -> TickOutcome {
        if !percentage.is_finite() {
            return TickOutcome::Rejected;
        }
        let clamped = percentage.clamp(0.0, FULL_PERCENTAGE);
        if clamped == self.percentage {
            return TickOutcome::Unchanged;
        }
        self.percentage = clamped;
        TickOutcome::Set
    }

    pub fn reset(&mut self) {
        self.percentage = FULL_PERCENTAGE;
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn is_warning(&self) -> bool {
        self.percentage <= WARNING_PERCENTAGE
    }
}
