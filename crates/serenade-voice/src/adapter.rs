//! Voice input adapter
//!
//! Wraps a platform [`SpeechCapability`] and enforces the session contract the
//! orchestrator depends on:
//!
//! ```text
//! start_listening ──► Started ──► Result(text) | Error(reason) ──► idle
//!        │                 ▲
//!        │   (synthesized if the platform skipped it)
//!        └── ignored while a session is active
//! ```
//!
//! Anything the platform reports after the session's terminal event, or after
//! `stop_listening`, is discarded.

use crate::capture::{CaptureSignal, SpeechCapability};
use serenade_core::{SerenadeError, SerenadeResult, VoiceEvent, VoiceInput};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Session {
    started: bool,
}

/// [`VoiceInput`] over an optional platform capability.
pub struct VoiceInputAdapter {
    capability: Option<Box<dyn SpeechCapability>>,
    session: Option<Session>,
    outbox: VecDeque<VoiceEvent>,
}

impl VoiceInputAdapter {
    /// Capability is checked once here. An unavailable one is treated as absent.
    pub fn new(capability: Box<dyn SpeechCapability>) -> Self {
        if capability.is_available() {
            Self::with_capability(Some(capability))
        } else {
            info!("🔇 Speech capture unavailable, typed fallback only");
            Self::with_capability(None)
        }
    }

    /// An adapter with no speech capability at all.
    pub fn unsupported() -> Self {
        Self::with_capability(None)
    }

    fn with_capability(capability: Option<Box<dyn SpeechCapability>>) -> Self {
        Self {
            capability,
            session: None,
            outbox: VecDeque::new(),
        }
    }

    /// Pull every signal the platform has ready and translate it.
    fn drain(&mut self) {
        let Some(capability) = self.capability.as_mut() else {
            return;
        };
        while let Some(signal) = capability.poll() {
            let Some(session) = self.session.as_mut() else {
                debug!("Discarding {:?} from an ended session", signal);
                continue;
            };
            let ended = match signal {
                CaptureSignal::Started => {
                    if !session.started {
                        session.started = true;
                        self.outbox.push_back(VoiceEvent::Started);
                    }
                    false
                }
                CaptureSignal::Transcript(text) => {
                    if !session.started {
                        self.outbox.push_back(VoiceEvent::Started);
                    }
                    debug!("Heard: {:?}", text);
                    self.outbox.push_back(VoiceEvent::Result(text));
                    true
                }
                CaptureSignal::Failed(reason) => {
                    if !session.started {
                        self.outbox.push_back(VoiceEvent::Started);
                    }
                    warn!("Recognition failed: {}", reason);
                    self.outbox.push_back(VoiceEvent::Error(reason));
                    true
                }
            };
            if ended {
                // Release the platform session (microphone stream) with the logical one.
                self.session = None;
                capability.abort();
            }
        }
    }
}

impl VoiceInput for VoiceInputAdapter {
    fn is_supported(&self) -> bool {
        self.capability.is_some()
    }

    fn start_listening(&mut self) -> SerenadeResult<()> {
        let Some(capability) = self.capability.as_mut() else {
            return Err(SerenadeError::UnsupportedCapability(
                "speech recognition".to_string(),
            ));
        };
        if self.session.is_some() {
            debug!("Already listening, start ignored");
            return Ok(());
        }
        capability.begin()?;
        self.session = Some(Session::default());
        Ok(())
    }

    fn stop_listening(&mut self) {
        if self.session.take().is_some() {
            if let Some(capability) = self.capability.as_mut() {
                capability.abort();
            }
            self.outbox.clear();
            debug!("Listening stopped");
        }
    }

    fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    fn poll_event(&mut self) -> Option<VoiceEvent> {
        if self.outbox.is_empty() {
            self.drain();
        }
        self.outbox.pop_front()
    }
}
