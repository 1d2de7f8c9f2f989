//! Phase tracking - countdown timer that gates input during animations
//!
//! A phase lasts `ttl` calls to [`PhaseTracker::update_phase`]. When it runs out, the
//! [`PhaseMap`] names the next phase and its duration; phases the map does not mention
//! (such as `Interactive`) last until something enters a new phase explicitly.

use duck_castle_types::{DuckPhase, ENTER_DURATION};

/// Next phase and its ttl for a phase that ran out, if any
pub type PhaseMap = fn(DuckPhase) -> Option<(DuckPhase, u32)>;

/// Transition table of the duck formation
pub const DUCK_PHASES: PhaseMap = duck_phases;

fn duck_phases(phase: DuckPhase) -> Option<(DuckPhase, u32)> {
    match phase {
        DuckPhase::Moving | DuckPhase::Connecting | DuckPhase::Entering => {
            Some((DuckPhase::Interactive, 0))
        }
        DuckPhase::Leaving => Some((DuckPhase::Entering, ENTER_DURATION)),
        DuckPhase::Initial | DuckPhase::Interactive => None,
    }
}

/// The timer collaborator used by the level
pub trait PhaseTracker {
    fn phase(&self) -> DuckPhase;

    /// Switch to `phase` for `ttl` updates
    fn enter_phase(&mut self, phase: DuckPhase, ttl: u32);

    /// Count down one update. Returns the previous phase if this update changed it.
    fn update_phase(&mut self, map: PhaseMap) -> Option<DuckPhase>;

    /// Progress through a phase of length `ttl`, from 0 to 1. `t` in `[0, 1]` blends
    /// between the last two updates.
    fn interpolate(&self, ttl: u32, t: f64) -> f64;
}

/// Plain countdown implementation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    phase: DuckPhase,
    phase_ttl: i32,
    old_ttl: i32,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::new(DuckPhase::Initial)
    }
}

impl PhaseState {
    pub fn new(phase: DuckPhase) -> Self {
        let mut state = Self {
            phase,
            phase_ttl: 0,
            old_ttl: 0,
        };
        state.enter_phase(phase, 0);
        state
    }

    /// Updates left before the phase runs out
    pub fn remaining(&self) -> i32 {
        self.phase_ttl
    }
}

impl PhaseTracker for PhaseState {
    fn phase(&self) -> DuckPhase {
        self.phase
    }

    fn enter_phase(&mut self, phase: DuckPhase, ttl: u32) {
        let ttl = i32::try_from(ttl).unwrap_or(i32::MAX);
        self.phase = phase;
        self.old_ttl = ttl;
        self.phase_ttl = ttl - 1;
    }

    fn update_phase(&mut self, map: PhaseMap) -> Option<DuckPhase> {
        self.old_ttl = self.phase_ttl;
        if self.phase_ttl > 0 {
            self.phase_ttl -= 1;
            return None;
        }

        let (next, ttl) = map(self.phase)?;
        let previous = self.phase;
        self.enter_phase(next, ttl);
        Some(previous)
    }

    fn interpolate(&self, ttl: u32, t: f64) -> f64 {
        if ttl == 0 {
            return 1.0;
        }
        let t = t.clamp(0.0, 1.0);
        let blended = self.old_ttl as f64 + (self.phase_ttl as f64 - self.old_ttl as f64) * t;
        1.0 - blended / ttl as f64
    }
}
