//! Settings for the whole experience.
//!
//! Every field has a default matching the shipped behavior, so an empty file
//! (or no file) yields the stock experience. Values can be overridden from a
//! TOML file and `SERENADE__*` environment variables.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | SERENADE_CONFIG | config/serenade | Path to the TOML file (extension optional). |
//! | SERENADE__TIMINGS__UNLOCK_DELAY_MS | 1500 | Pause between "unlocked" and the letter. |
//! | SERENADE__TIMINGS__REVEAL_PERIOD_MS | 1200 | One letter paragraph per period. |
//! | SERENADE__CELEBRATION__BURST_COUNT | 100 | Units per celebration burst. |
//! | SERENADE__VOICE__LISTEN_TIMEOUT_MS | 8000 | Give up on a capture session after this long. |

use crate::error::{SerenadeError, SerenadeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fixed delays of the stage machine, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Between a matched phrase and entering the letter.
    pub unlock_delay_ms: u64,
    /// How long a "try again" message stays up.
    pub misheard_reset_ms: u64,
    /// How long a recognition error stays up.
    pub error_reset_ms: u64,
    /// Letter reveal tick.
    pub reveal_period_ms: u64,
    /// Between entering the letter and starting the music.
    pub audio_start_delay_ms: u64,
    /// Between entering the proposal and showing the hint.
    pub hint_delay_ms: u64,
    /// Between the declaration and the decision buttons.
    pub decision_delay_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            unlock_delay_ms: 1500,
            misheard_reset_ms: 3000,
            error_reset_ms: 2000,
            reveal_period_ms: 1200,
            audio_start_delay_ms: 500,
            hint_delay_ms: 1000,
            decision_delay_ms: 2000,
        }
    }
}

impl Timings {
    pub fn unlock_delay(&self) -> Duration {
        Duration::from_millis(self.unlock_delay_ms)
    }

    pub fn misheard_reset(&self) -> Duration {
        Duration::from_millis(self.misheard_reset_ms)
    }

    pub fn error_reset(&self) -> Duration {
        Duration::from_millis(self.error_reset_ms)
    }

    pub fn reveal_period(&self) -> Duration {
        Duration::from_millis(self.reveal_period_ms)
    }

    pub fn audio_start_delay(&self) -> Duration {
        Duration::from_millis(self.audio_start_delay_ms)
    }

    pub fn hint_delay(&self) -> Duration {
        Duration::from_millis(self.hint_delay_ms)
    }

    pub fn decision_delay(&self) -> Duration {
        Duration::from_millis(self.decision_delay_ms)
    }
}

/// Celebration burst shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CelebrationSettings {
    pub burst_count: u32,
    /// Offset between consecutive units.
    pub stagger_ms: u64,
    /// Each unit removes itself after this long.
    pub lifetime_ms: u64,
    pub min_size_px: f32,
    pub max_size_px: f32,
}

impl Default for CelebrationSettings {
    fn default() -> Self {
        Self {
            burst_count: 100,
            stagger_ms: 10,
            lifetime_ms: 2000,
            min_size_px: 16.0,
            max_size_px: 40.0,
        }
    }
}

/// Ambient loop output shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Echo delay line length in seconds.
    pub echo_delay_secs: f32,
    /// Fraction of the echo fed back into the delay line (0..1).
    pub echo_feedback: f32,
    /// Wet level of the echo in the output mix (0..1).
    pub echo_mix: f32,
    /// Overall output gain.
    pub master_gain: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            echo_delay_secs: 0.3,
            echo_feedback: 0.35,
            echo_mix: 0.3,
            master_gain: 1.0,
        }
    }
}

/// Microphone capture and turn detection.
/// Capture rates the voice activity detector accepts.
pub const CAPTURE_SAMPLE_RATES: [u32; 4] = [8000, 16000, 32000, 48000];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Disable the microphone entirely (typed fallback only).
    pub enabled: bool,
    pub sample_rate: u32,
    /// Silence after speech that ends a capture.
    pub gap_ms: u64,
    /// Shorter utterances are dropped.
    pub min_speech_ms: u64,
    /// A session with no committed speech fails after this long.
    pub listen_timeout_ms: u64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 16000,
            gap_ms: 800,
            min_speech_ms: 200,
            listen_timeout_ms: 8000,
        }
    }
}

impl VoiceSettings {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerenadeConfig {
    pub timings: Timings,
    pub celebration: CelebrationSettings,
    pub audio: AudioSettings,
    pub voice: VoiceSettings,
}

impl SerenadeConfig {
    /// Load from file and environment. Precedence: env > `SERENADE_CONFIG` path
    /// (or `config/serenade.toml`) > defaults.
    pub fn load() -> SerenadeResult<Self> {
        let config_path =
            std::env::var("SERENADE_CONFIG").unwrap_or_else(|_| "config/serenade".to_string());
        Self::load_from(Some(Path::new(&config_path)), true)
    }

    /// Load from an optional file, optionally layering `SERENADE__*` env vars on top.
    pub fn load_from(path: Option<&Path>, with_env: bool) -> SerenadeResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            let with_ext = path.with_extension("toml");
            if path.is_file() {
                builder = builder.add_source(config::File::from(path));
            } else if with_ext.is_file() {
                builder = builder.add_source(config::File::from(with_ext.as_path()));
            }
        }

        if with_env {
            builder = builder.add_source(
                config::Environment::with_prefix("SERENADE")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let loaded: Self = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the scheduler or renderer cannot honor.
    pub fn validate(&self) -> SerenadeResult<()> {
        if self.timings.reveal_period_ms == 0 {
            return Err(SerenadeError::Config(
                "timings.reveal_period_ms must be greater than zero".to_string(),
            ));
        }
        let c = &self.celebration;
        if c.lifetime_ms == 0 {
            return Err(SerenadeError::Config(
                "celebration.lifetime_ms must be greater than zero".to_string(),
            ));
        }
        if !(c.min_size_px > 0.0 && c.min_size_px <= c.max_size_px) {
            return Err(SerenadeError::Config(format!(
                "celebration size bounds invalid: min {} max {}",
                c.min_size_px, c.max_size_px
            )));
        }
        let a = &self.audio;
        if !(0.0..1.0).contains(&a.echo_feedback) {
            return Err(SerenadeError::Config(format!(
                "audio.echo_feedback must be in [0, 1), got {}",
                a.echo_feedback
            )));
        }
        if !(0.0..=1.0).contains(&a.echo_mix) || a.echo_delay_secs <= 0.0 {
            return Err(SerenadeError::Config(
                "audio echo settings out of range".to_string(),
            ));
        }
        if !CAPTURE_SAMPLE_RATES.contains(&self.voice.sample_rate) {
            return Err(SerenadeError::Config(format!(
                "voice.sample_rate must be one of {:?}, got {}",
                CAPTURE_SAMPLE_RATES, self.voice.sample_rate
            )));
        }
        if self.voice.listen_timeout_ms == 0 {
            return Err(SerenadeError::Config(
                "voice.listen_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
