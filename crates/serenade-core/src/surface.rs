//! Render snapshot handed to the surface after every applied event.

use crate::letter::Letter;
use crate::proposal::{Position, ProposalOutcome, ProposalPhase};
use crate::stage::{LockView, SessionState, Stage};

/// Everything a surface needs to draw the current screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub stage: Stage,
    pub lock: LockView,
    /// Speech unsupported: the prompt asks for typed text.
    pub typed_fallback: bool,
    pub salutation: String,
    /// Paragraphs revealed so far.
    pub paragraphs: Vec<String>,
    pub paragraph_total: usize,
    pub can_continue: bool,
    pub music_playing: bool,
    pub proposal_phase: ProposalPhase,
    pub evasive: Position,
    pub outcome: ProposalOutcome,
}

impl Frame {
    pub fn compose(state: &SessionState, letter: &Letter, music_playing: bool) -> Self {
        Self {
            stage: state.stage,
            lock: state.lock.clone(),
            typed_fallback: !state.speech_supported,
            salutation: letter.salutation.clone(),
            paragraphs: letter.visible(&state.reveal).to_vec(),
            paragraph_total: state.reveal.total(),
            can_continue: state.can_continue(),
            music_playing,
            proposal_phase: state.proposal.phase,
            evasive: state.proposal.evasive,
            outcome: state.proposal.outcome,
        }
    }
}
