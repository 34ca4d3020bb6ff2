//! Error types for speech capture and audio output

use serenade_core::SerenadeError;
use thiserror::Error;

/// Result type alias for voice and audio operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors raised by the platform backends
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("VAD initialization failed: {0}")]
    VadInit(String),

    #[error("VAD processing error: {0}")]
    VadProcessing(String),

    #[error("Audio playback error: {0}")]
    Playback(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for VoiceError {
    fn from(err: cpal::DevicesError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for VoiceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for VoiceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for VoiceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<hound::Error> for VoiceError {
    fn from(err: hound::Error) -> Self {
        VoiceError::Stt(format!("WAV encoding failed: {}", err))
    }
}

/// Backend failures collapse into the orchestrator's recoverable taxonomy.
impl From<VoiceError> for SerenadeError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Unavailable(m) => SerenadeError::UnsupportedCapability(m),
            VoiceError::Playback(m) => SerenadeError::ResumeFailure(m),
            VoiceError::Config(m) => SerenadeError::Config(m),
            VoiceError::Io(e) => SerenadeError::Io(e.to_string()),
            other => SerenadeError::Recognition(other.to_string()),
        }
    }
}
