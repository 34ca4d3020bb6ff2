//! Gap logic: decides when an utterance is over.
//!
//! Speech followed by `gap` of silence commits the buffered audio as one
//! utterance. Utterances shorter than `min_speech` are dropped. Time is
//! passed in by the caller so the logic can be driven without a microphone.

use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Emitted by [`TurnManager::process`]
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// First speech frame of an utterance
    SpeechStarted,

    /// Utterance finished; samples run from speech start to the last frame
    Committed { samples: Vec<f32>, duration: Duration },

    /// Utterance ended but was too short to keep
    Dropped { duration: Duration },
}

/// Configuration for turn detection
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Silence that ends an utterance (default: 800ms)
    pub gap: Duration,

    /// Shorter utterances are dropped (default: 200ms)
    pub min_speech: Duration,

    /// Utterances are force-committed at this length (default: 10s)
    pub max_speech: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            gap: Duration::from_millis(800),
            min_speech: Duration::from_millis(200),
            max_speech: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Idle,
    Speaking,
    Gap,
}

/// Turn detector fed with per-frame VAD decisions
pub struct TurnManager {
    config: TurnConfig,
    state: TurnState,
    speech_start: Option<Instant>,
    last_speech: Option<Instant>,
    buffer: Vec<f32>,
}

impl TurnManager {
    pub fn new(config: TurnConfig) -> Self {
        Self {
            config,
            state: TurnState::Idle,
            speech_start: None,
            last_speech: None,
            buffer: Vec::new(),
        }
    }

    /// Feed one frame and its VAD decision, observed at `now`.
    pub fn process(&mut self, is_speech: bool, frame: &[f32], now: Instant) -> Option<TurnEvent> {
        match (self.state, is_speech) {
            (TurnState::Idle, true) => {
                debug!("🎤 Speech started");
                self.state = TurnState::Speaking;
                self.speech_start = Some(now);
                self.last_speech = Some(now);
                self.buffer.clear();
                self.buffer.extend_from_slice(frame);
                Some(TurnEvent::SpeechStarted)
            }
            (TurnState::Idle, false) => None,
            (TurnState::Speaking, true) | (TurnState::Gap, true) => {
                self.state = TurnState::Speaking;
                self.last_speech = Some(now);
                self.buffer.extend_from_slice(frame);
                let elapsed = self.speech_start.map(|s| now.duration_since(s)).unwrap_or_default();
                if elapsed >= self.config.max_speech {
                    info!("⏱️ Max utterance length reached, committing");
                    return Some(self.commit());
                }
                None
            }
            (TurnState::Speaking, false) => {
                self.state = TurnState::Gap;
                self.buffer.extend_from_slice(frame);
                None
            }
            (TurnState::Gap, false) => {
                self.buffer.extend_from_slice(frame);
                let silent_for = self.last_speech.map(|t| now.duration_since(t)).unwrap_or_default();
                if silent_for >= self.config.gap {
                    return Some(self.commit());
                }
                None
            }
        }
    }

    /// Speech length runs from the first to the last speech frame.
    fn commit(&mut self) -> TurnEvent {
        let duration = match (self.speech_start, self.last_speech) {
            (Some(start), Some(last)) => last.duration_since(start),
            _ => Duration::ZERO,
        };
        let samples = std::mem::take(&mut self.buffer);
        self.reset();

        if duration < self.config.min_speech {
            debug!("⏭️ Utterance too short ({:?}), dropped", duration);
            return TurnEvent::Dropped { duration };
        }
        info!("🎯 Utterance committed: {:?}, {} samples", duration, samples.len());
        TurnEvent::Committed { samples, duration }
    }

    /// Forget any partial utterance.
    pub fn reset(&mut self) {
        self.state = TurnState::Idle;
        self.speech_start = None;
        self.last_speech = None;
        self.buffer.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.state == TurnState::Idle
    }
}
