//! Deterministic speech capability for demos and tests.

use crate::capture::{CaptureSignal, SpeechCapability};
use crate::error::{VoiceError, VoiceResult};
use std::collections::VecDeque;

/// What one scripted session produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// `Started` then the transcript
    Heard(String),
    /// Transcript without a prior start notification
    HeardEarly(String),
    /// `Started` then a failure
    Fails(String),
    /// `begin` itself fails
    RefusesToStart(String),
    /// `Started` and nothing else until aborted
    Silent,
}

/// Replays a queue of canned outcomes, one per session. An exhausted script
/// behaves like [`ScriptedOutcome::Silent`].
#[derive(Debug, Default)]
pub struct ScriptedSpeech {
    available: bool,
    script: VecDeque<ScriptedOutcome>,
    pending: VecDeque<CaptureSignal>,
    sessions: usize,
    aborts: usize,
}

impl ScriptedSpeech {
    pub fn new(script: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            available: true,
            script: script.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Queue another outcome.
    pub fn push(&mut self, outcome: ScriptedOutcome) {
        self.script.push_back(outcome);
    }

    /// Inject a signal into the current session, e.g. a late duplicate.
    pub fn inject(&mut self, signal: CaptureSignal) {
        self.pending.push_back(signal);
    }

    /// Sessions begun so far.
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    pub fn aborts(&self) -> usize {
        self.aborts
    }
}

impl SpeechCapability for ScriptedSpeech {
    fn is_available(&self) -> bool {
        self.available
    }

    fn begin(&mut self) -> VoiceResult<()> {
        if !self.available {
            return Err(VoiceError::Unavailable("scripted speech disabled".to_string()));
        }
        self.pending.clear();
        let outcome = self.script.pop_front().unwrap_or(ScriptedOutcome::Silent);
        match outcome {
            ScriptedOutcome::RefusesToStart(reason) => {
                return Err(VoiceError::AudioDevice(reason));
            }
            ScriptedOutcome::Heard(text) => {
                self.pending.push_back(CaptureSignal::Started);
                self.pending.push_back(CaptureSignal::Transcript(text));
            }
            ScriptedOutcome::HeardEarly(text) => {
                self.pending.push_back(CaptureSignal::Transcript(text));
            }
            ScriptedOutcome::Fails(reason) => {
                self.pending.push_back(CaptureSignal::Started);
                self.pending.push_back(CaptureSignal::Failed(reason));
            }
            ScriptedOutcome::Silent => {
                self.pending.push_back(CaptureSignal::Started);
            }
        }
        self.sessions += 1;
        Ok(())
    }

    fn abort(&mut self) {
        self.pending.clear();
        self.aborts += 1;
    }

    fn poll(&mut self) -> Option<CaptureSignal> {
        self.pending.pop_front()
    }
}
