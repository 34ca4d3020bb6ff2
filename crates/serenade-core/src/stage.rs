//! Stage machine: Lock → Letter → Proposal.
//!
//! [`step`] is a pure function from the current [`SessionState`] and one
//! [`Event`] to the next state plus the [`Effect`]s the controller must apply
//! (timers to start or cancel, voice and audio commands). Nothing here touches
//! a clock or a device.
//!
//! ```text
//!   Lock ──match + unlock delay──▶ Letter ──continue (all shown)──▶ Proposal
//!    │ Prompt ⇄ Listening                │ reveal tick every period        │ Intro → Hint → Declaration
//!    │ Misheard / Error ──reset──▶ Prompt│ audio start after delay         │ → Decision → Celebration
//! ```

use crate::config::Timings;
use crate::letter::RevealProgress;
use crate::matcher::PhraseMatcher;
use crate::proposal::{Position, ProposalOutcome, ProposalPhase, ProposalState};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lock,
    Letter,
    Proposal,
}

/// What the lock screen currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockView {
    Prompt,
    Listening,
    /// "Try again" with the literal heard or typed text.
    Misheard(String),
    /// Capture failed.
    Error(String),
    /// Accepted; waiting out the unlock delay.
    Unlocked,
}

/// Named timers. At most one of each kind is armed at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LockReset,
    UnlockAdvance,
    RevealTick,
    AudioStart,
    HintReveal,
    DecisionReveal,
}

impl TimerKind {
    /// Stage that owns the timer; it must not outlive that stage.
    pub fn owner(&self) -> Stage {
        match self {
            TimerKind::LockReset | TimerKind::UnlockAdvance => Stage::Lock,
            TimerKind::RevealTick | TimerKind::AudioStart => Stage::Letter,
            TimerKind::HintReveal | TimerKind::DecisionReveal => Stage::Proposal,
        }
    }
}

/// Inputs to the stage machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Lock prompt tapped.
    Tap,
    /// Fallback text entry submitted.
    Typed(String),
    ListeningStarted,
    Heard(String),
    RecognitionFailed(String),
    Timer(TimerKind),
    ToggleAudio,
    /// "Continue" on the letter.
    Continue,
    /// Tap on the proposal hint.
    RevealDeclaration,
    Accept,
    /// Evasive control activated; carries the position it ran to.
    Evade(Position),
}

/// Side effects requested by a transition, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTimer { kind: TimerKind, delay: Duration },
    StartInterval { kind: TimerKind, period: Duration },
    CancelTimer(TimerKind),
    StartListening,
    StopListening,
    PlayChime,
    PlayAudio,
    StopAudio,
    ToggleAudio,
    Celebrate,
}

/// Fixed inputs to every transition.
#[derive(Debug, Clone)]
pub struct Rules {
    pub timings: Timings,
    pub matcher: PhraseMatcher,
    pub paragraph_count: usize,
}

/// The whole session. Exactly one stage is active.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub stage: Stage,
    pub lock: LockView,
    /// Voice capture available; when false the prompt asks for typed text.
    pub speech_supported: bool,
    pub reveal: RevealProgress,
    pub proposal: ProposalState,
}

impl SessionState {
    pub fn new(paragraph_count: usize, speech_supported: bool) -> Self {
        Self {
            stage: Stage::Lock,
            lock: LockView::Prompt,
            speech_supported,
            reveal: RevealProgress::new(paragraph_count),
            proposal: ProposalState::default(),
        }
    }

    /// "Continue" is offered once every paragraph is visible.
    pub fn can_continue(&self) -> bool {
        self.stage == Stage::Letter && self.reveal.is_complete()
    }
}

/// Result of one [`step`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &SessionState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

/// Apply one event.
pub fn step(state: &SessionState, event: Event, rules: &Rules) -> Transition {
    match state.stage {
        Stage::Lock => step_lock(state, event, rules),
        Stage::Letter => step_letter(state, event, rules),
        Stage::Proposal => step_proposal(state, event, rules),
    }
}

fn step_lock(state: &SessionState, event: Event, rules: &Rules) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match (&state.lock, event) {
        (LockView::Prompt, Event::Tap) => {
            if state.speech_supported {
                effects.push(Effect::StartListening);
            } else {
                debug!("tap without speech support; waiting for typed text");
            }
        }
        (LockView::Prompt, Event::ListeningStarted) => {
            next.lock = LockView::Listening;
        }
        (LockView::Prompt | LockView::Listening, Event::Heard(text)) => {
            evaluate(&mut next, &mut effects, text, rules);
        }
        (LockView::Prompt | LockView::Listening, Event::Typed(text)) => {
            // typed text wins over a capture that may still be running
            effects.push(Effect::StopListening);
            evaluate(&mut next, &mut effects, text, rules);
        }
        (LockView::Prompt | LockView::Listening, Event::RecognitionFailed(reason)) => {
            info!(%reason, "recognition failed");
            next.lock = LockView::Error(reason);
            effects.push(Effect::StartTimer {
                kind: TimerKind::LockReset,
                delay: rules.timings.error_reset(),
            });
        }
        (LockView::Misheard(_) | LockView::Error(_), Event::Timer(TimerKind::LockReset)) => {
            next.lock = LockView::Prompt;
        }
        (LockView::Unlocked, Event::Timer(TimerKind::UnlockAdvance)) => {
            info!("💌 Entering letter stage");
            next.stage = Stage::Letter;
            next.reveal = RevealProgress::new(rules.paragraph_count);
            if !next.reveal.is_complete() {
                effects.push(Effect::StartInterval {
                    kind: TimerKind::RevealTick,
                    period: rules.timings.reveal_period(),
                });
            }
            effects.push(Effect::StartTimer {
                kind: TimerKind::AudioStart,
                delay: rules.timings.audio_start_delay(),
            });
        }
        (view, event) => {
            debug!(?view, ?event, "lock event ignored");
            return Transition::unchanged(state);
        }
    }

    Transition {
        state: next,
        effects,
    }
}

fn evaluate(next: &mut SessionState, effects: &mut Vec<Effect>, text: String, rules: &Rules) {
    let attempt = rules.matcher.attempt(text);
    match attempt.verdict() {
        Ok(text) => {
            info!(%text, "🔓 Unlock phrase accepted");
            next.lock = LockView::Unlocked;
            effects.push(Effect::PlayChime);
            effects.push(Effect::StartTimer {
                kind: TimerKind::UnlockAdvance,
                delay: rules.timings.unlock_delay(),
            });
        }
        Err(err) => {
            info!(%err, "unlock attempt rejected");
            next.lock = LockView::Misheard(attempt.text.clone());
            effects.push(Effect::StartTimer {
                kind: TimerKind::LockReset,
                delay: rules.timings.misheard_reset(),
            });
        }
    }
}

fn step_letter(state: &SessionState, event: Event, rules: &Rules) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        Event::Timer(TimerKind::RevealTick) => {
            if next.reveal.advance() {
                debug!(
                    shown = next.reveal.shown(),
                    total = next.reveal.total(),
                    "paragraph revealed"
                );
            }
            if next.reveal.is_complete() {
                effects.push(Effect::CancelTimer(TimerKind::RevealTick));
            }
        }
        Event::Timer(TimerKind::AudioStart) => {
            effects.push(Effect::PlayAudio);
        }
        Event::ToggleAudio => {
            // Manual control wins over the pending auto-start.
            effects.push(Effect::CancelTimer(TimerKind::AudioStart));
            effects.push(Effect::ToggleAudio);
        }
        Event::Continue if state.reveal.is_complete() => {
            info!("💍 Entering proposal stage");
            effects.push(Effect::CancelTimer(TimerKind::RevealTick));
            effects.push(Effect::CancelTimer(TimerKind::AudioStart));
            effects.push(Effect::StopAudio);
            next.stage = Stage::Proposal;
            next.proposal = ProposalState::default();
            effects.push(Effect::StartTimer {
                kind: TimerKind::HintReveal,
                delay: rules.timings.hint_delay(),
            });
        }
        event => {
            debug!(?event, "letter event ignored");
            return Transition::unchanged(state);
        }
    }

    Transition {
        state: next,
        effects,
    }
}

fn step_proposal(state: &SessionState, event: Event, rules: &Rules) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();
    let proposal = &mut next.proposal;

    match (proposal.phase, event) {
        (ProposalPhase::Intro, Event::Timer(TimerKind::HintReveal)) => {
            proposal.phase = ProposalPhase::Hint;
        }
        (ProposalPhase::Hint, Event::RevealDeclaration) => {
            proposal.phase = ProposalPhase::Declaration;
            effects.push(Effect::StartTimer {
                kind: TimerKind::DecisionReveal,
                delay: rules.timings.decision_delay(),
            });
        }
        (ProposalPhase::Declaration, Event::Timer(TimerKind::DecisionReveal)) => {
            proposal.phase = ProposalPhase::Decision;
        }
        (ProposalPhase::Decision, Event::Evade(to)) => {
            proposal.evasive = to;
            proposal.evasions += 1;
            debug!(x = to.x, y = to.y, evasions = proposal.evasions, "evasive control moved");
        }
        (ProposalPhase::Decision, Event::Accept) => {
            info!("🎉 Proposal accepted");
            proposal.phase = ProposalPhase::Celebration;
            proposal.outcome = ProposalOutcome::Accepted;
            effects.push(Effect::Celebrate);
        }
        (phase, event) => {
            debug!(?phase, ?event, "proposal event ignored");
            return Transition::unchanged(state);
        }
    }

    Transition {
        state: next,
        effects,
    }
}
