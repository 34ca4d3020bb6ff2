//! Proposal sub-phases and the evasive control.
//!
//! The decline button never records a negative answer. Each activation moves
//! it somewhere else on screen and the outcome stays `Pending`.

use rand::Rng;

/// Lowest coordinate (percent of each axis) the evasive control may land on.
pub const SAFE_MIN_PCT: f32 = 10.0;
/// Highest coordinate (percent of each axis) the evasive control may land on.
pub const SAFE_MAX_PCT: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalPhase {
    /// Stage just entered; hint not shown yet.
    Intro,
    /// "Tap to read what I have to say" hint.
    Hint,
    /// The question itself, buttons still hidden.
    Declaration,
    /// Accept and evasive controls are live.
    Decision,
    Celebration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    Pending,
    Accepted,
}

/// Screen position in percent of the viewport, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Where the evasive control sits before its first activation.
    pub const START: Position = Position::new(60.0, 70.0);

    pub fn within_safe_bounds(&self) -> bool {
        let safe = SAFE_MIN_PCT..=SAFE_MAX_PCT;
        safe.contains(&self.x) && safe.contains(&self.y)
    }
}

/// Relocates the evasive control inside the safe bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvasiveControl;

impl EvasiveControl {
    /// A new position, different from `current`, inside [10%, 90%] on both axes.
    pub fn relocate<R: Rng + ?Sized>(&self, current: Position, rng: &mut R) -> Position {
        loop {
            let next = Position::new(
                rng.gen_range(SAFE_MIN_PCT..=SAFE_MAX_PCT),
                rng.gen_range(SAFE_MIN_PCT..=SAFE_MAX_PCT),
            );
            if next != current {
                return next;
            }
        }
    }
}

/// Proposal stage state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalState {
    pub phase: ProposalPhase,
    pub outcome: ProposalOutcome,
    pub evasive: Position,
    /// How many times the evasive control has run away.
    pub evasions: u32,
}

impl Default for ProposalState {
    fn default() -> Self {
        Self {
            phase: ProposalPhase::Intro,
            outcome: ProposalOutcome::Pending,
            evasive: Position::START,
            evasions: 0,
        }
    }
}
