//! Voice Activity Detection using WebRTC VAD

use crate::error::{VoiceError, VoiceResult};
use tracing::info;
use webrtc_vad::{SampleRate, Vad, VadMode};

/// Configuration for VAD detection
#[derive(Debug, Clone)]
pub struct VadConfig {
    /// 8000, 16000, 32000 or 48000 Hz
    pub sample_rate: u32,

    /// Detection mode (0-3, where 3 is most aggressive)
    pub mode: u8,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            mode: 2,
        }
    }
}

fn webrtc_params(config: &VadConfig) -> VoiceResult<(VadMode, SampleRate)> {
    let mode = match config.mode {
        0 => VadMode::Quality,
        1 => VadMode::LowBitrate,
        2 => VadMode::Aggressive,
        3 => VadMode::VeryAggressive,
        other => return Err(VoiceError::VadInit(format!("VAD mode must be 0-3, got {}", other))),
    };
    let rate = match config.sample_rate {
        8000 => SampleRate::Rate8kHz,
        16000 => SampleRate::Rate16kHz,
        32000 => SampleRate::Rate32kHz,
        48000 => SampleRate::Rate48kHz,
        other => {
            return Err(VoiceError::VadInit(format!(
                "WebRTC VAD only supports 8000, 16000, 32000, or 48000 Hz, got {}",
                other
            )))
        }
    };
    Ok((mode, rate))
}

/// Speech/silence classifier over 30ms frames
pub struct VadDetector {
    vad: Vad,
    config: VadConfig,
    chunk_size: usize,
}

impl VadDetector {
    pub fn new(config: VadConfig) -> VoiceResult<Self> {
        let (mode, rate) = webrtc_params(&config)?;
        let chunk_size = (config.sample_rate as usize * 30) / 1000;

        let mut vad = Vad::new();
        vad.set_mode(mode);
        vad.set_sample_rate(rate);

        info!(
            "🎙️ VAD ready ({}Hz, mode {}, {} samples/frame)",
            config.sample_rate, config.mode, chunk_size
        );

        Ok(Self {
            vad,
            config,
            chunk_size,
        })
    }

    /// Classify one frame. The frame must be exactly [`VadDetector::chunk_size`] samples.
    pub fn is_speech(&mut self, frame: &[f32]) -> VoiceResult<bool> {
        if frame.len() != self.chunk_size {
            return Err(VoiceError::VadProcessing(format!(
                "Expected {} samples, got {}",
                self.chunk_size,
                frame.len()
            )));
        }

        let pcm: Vec<i16> = frame
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();

        self.vad
            .is_voice_segment(&pcm)
            .map_err(|e| VoiceError::VadProcessing(format!("{:?}", e)))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_thirty_milliseconds() {
        let detector = VadDetector::new(VadConfig::default()).unwrap();
        assert_eq!(detector.chunk_size(), 480);
        assert_eq!(detector.sample_rate(), 16000);
    }

    #[test]
    fn unsupported_rate_is_rejected() {
        let config = VadConfig {
            sample_rate: 44100,
            ..Default::default()
        };
        assert!(matches!(VadDetector::new(config), Err(VoiceError::VadInit(_))));
    }

    #[test]
    fn wrong_frame_length_is_an_error() {
        let mut detector = VadDetector::new(VadConfig::default()).unwrap();
        assert!(detector.is_speech(&[0.0; 100]).is_err());
    }

    #[test]
    fn silence_is_not_speech() {
        let mut detector = VadDetector::new(VadConfig::default()).unwrap();
        assert!(!detector.is_speech(&[0.0; 480]).unwrap());
    }
}
