//! # Serenade Core - Unlock/Reveal Orchestration
//!
//! The stage machine behind the voice-locked letter: a spoken (or typed)
//! phrase unlocks a letter revealed one paragraph at a time over ambient
//! music, followed by a proposal whose decline button refuses to be pressed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Orchestrator                           │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │ VoiceInput   │ → │ Phrase       │ → │ step()       │      │
//! │  │ (capability) │   │ Matcher      │   │ Lock→Letter→ │      │
//! │  └──────────────┘   └──────────────┘   │ Proposal     │      │
//! │         ↑                               └──────┬───────┘      │
//! │         │            ┌──────────────┐          │ effects      │
//! │         └────────────│  Scheduler   │←─────────┤              │
//! │                      │ (logical t)  │          ↓              │
//! │  ┌──────────────┐    └──────────────┘   ┌──────────────┐      │
//! │  │ RenderSurface│←── Frame / Particles ─│ AmbientAudio │      │
//! │  └──────────────┘                        └──────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod capability;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod error;
pub mod letter;
pub mod matcher;
pub mod orchestrator;
pub mod proposal;
pub mod stage;
pub mod surface;

pub use capability::{AmbientAudio, RenderSurface, VoiceEvent, VoiceInput};
pub use celebration::{CelebrationTrigger, Particle};
pub use clock::{Fired, Scheduler, TimerHandle};
pub use config::{
    AudioSettings, CelebrationSettings, SerenadeConfig, Timings, VoiceSettings, CAPTURE_SAMPLE_RATES,
};
pub use error::{SerenadeError, SerenadeResult};
pub use letter::{Letter, RevealProgress};
pub use matcher::{matches, PhraseMatcher, UnlockAttempt, ACCEPTED_PHRASES};
pub use orchestrator::Orchestrator;
pub use proposal::{EvasiveControl, Position, ProposalOutcome, ProposalPhase, ProposalState};
pub use stage::{step, Effect, Event, LockView, Rules, SessionState, Stage, TimerKind, Transition};
pub use surface::Frame;
