//! Error types for the Serenade core

use thiserror::Error;

/// Result type alias for core operations
pub type SerenadeResult<T> = Result<T, SerenadeError>;

/// Every failure the orchestrator knows about.
///
/// None of these are fatal: the orchestrator logs them and falls back to a
/// state it has already shown (prompt, idle audio, skipped particle).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerenadeError {
    /// Speech or audio capability is absent on this platform.
    #[error("Capability unsupported: {0}")]
    UnsupportedCapability(String),

    /// Capture failed or microphone permission was denied.
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// Valid input that does not contain an accepted phrase.
    #[error("No accepted phrase in {0:?}")]
    NoMatch(String),

    /// The audio context could not be resumed; the engine stays idle.
    #[error("Audio resume failed: {0}")]
    ResumeFailure(String),

    /// A rendering collaborator call failed.
    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<config::ConfigError> for SerenadeError {
    fn from(err: config::ConfigError) -> Self {
        SerenadeError::Config(err.to_string())
    }
}

impl From<std::io::Error> for SerenadeError {
    fn from(err: std::io::Error) -> Self {
        SerenadeError::Io(err.to_string())
    }
}
