//! # Serenade Voice - Speech In, Melody Out
//!
//! Platform side of the serenade: one-shot speech capture behind the
//! [`serenade_core::VoiceInput`] contract, and the ambient melody loop behind
//! [`serenade_core::AmbientAudio`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   VoiceInputAdapter                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │   Audio In   │→ │  WebRTC VAD  │→ │ Turn Manager │→ STT  │
//! │  │    (cpal)    │  │  (30ms)      │  │  (800ms gap) │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   AudioLoopEngine                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │ Melody pass  │→ │ Tone + echo  │→ │  Audio Out   │       │
//! │  │ (re-armed)   │  │  envelopes   │  │   (rodio)    │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod adapter;
pub mod audio;
pub mod capture;
pub mod engine;
pub mod error;
pub mod graph;
pub mod scripted;
pub mod stt;
pub mod synth;
pub mod turn;
pub mod vad;

pub use adapter::VoiceInputAdapter;
pub use audio::{AudioCapture, AudioChunk, CaptureFeed, CaptureFormat};
pub use capture::{CaptureSignal, MicrophoneSpeech, SpeechCapability};
pub use engine::{AudioLoopEngine, LoopState};
pub use error::{VoiceError, VoiceResult};
pub use graph::{GraphProbe, RecordingGraph, RodioGraph, SynthGraph};
pub use scripted::{ScriptedOutcome, ScriptedSpeech};
pub use stt::{create_best_stt, encode_wav, OpenAiStt, PlaceholderStt, SttBackend};
pub use synth::{Envelope, Note, Tone, MELODY};
pub use turn::{TurnConfig, TurnEvent, TurnManager};
pub use vad::{VadConfig, VadDetector};

use serenade_core::SerenadeConfig;

/// Speech input for this host: the microphone when enabled and present,
/// otherwise an adapter that reports speech as unsupported.
pub fn default_voice_input(config: &SerenadeConfig) -> VoiceInputAdapter {
    if !config.voice.enabled {
        return VoiceInputAdapter::unsupported();
    }
    let mic = MicrophoneSpeech::new(config.voice.clone(), create_best_stt());
    VoiceInputAdapter::new(Box::new(mic))
}

/// The ambient loop on the default output device.
pub fn default_audio(config: &SerenadeConfig) -> AudioLoopEngine<RodioGraph> {
    AudioLoopEngine::new(RodioGraph::new(&config.audio))
}
