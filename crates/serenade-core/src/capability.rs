//! Narrow interfaces to the platform collaborators.
//!
//! The orchestrator only ever talks to speech capture, the ambient audio loop
//! and the rendering surface through these traits. `serenade-voice` provides
//! the real implementations; tests provide deterministic fakes.

use crate::celebration::Particle;
use crate::error::SerenadeResult;
use crate::surface::Frame;

/// Observable events of one capture session, in order: `Started`, then
/// exactly one of `Result` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Started,
    Result(String),
    Error(String),
}

/// One-shot speech capture.
pub trait VoiceInput {
    /// Decided once at construction. When false, use typed fallback.
    fn is_supported(&self) -> bool;

    /// Begin a single capture session. Ignored while one is active.
    fn start_listening(&mut self) -> SerenadeResult<()>;

    /// Abort the active session, if any. No further events for it.
    fn stop_listening(&mut self);

    fn is_listening(&self) -> bool;

    /// Next pending event, if any. Never blocks.
    fn poll_event(&mut self) -> Option<VoiceEvent>;
}

/// The ambient melody loop plus the one-shot unlock chime.
pub trait AmbientAudio {
    /// Start looping. No-op when already looping. A resume failure leaves the
    /// loop idle and is returned as `ResumeFailure`.
    fn play(&mut self) -> SerenadeResult<()>;

    /// Stop arming new passes; notes already scheduled ring out.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    /// Pause when playing, resume otherwise.
    fn toggle(&mut self) -> SerenadeResult<()> {
        if self.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Short acknowledgment played on unlock.
    fn chime(&mut self) -> SerenadeResult<()>;

    /// Give the loop a chance to re-arm its next pass.
    fn service(&mut self) {}

    /// Release the underlying audio resources. Safe to call more than once.
    fn release(&mut self);
}

/// Where frames and celebration units are drawn.
pub trait RenderSurface {
    fn render(&mut self, frame: &Frame) -> SerenadeResult<()>;

    fn spawn_particle(&mut self, particle: &Particle) -> SerenadeResult<()>;

    fn remove_particle(&mut self, id: u32) -> SerenadeResult<()>;
}
