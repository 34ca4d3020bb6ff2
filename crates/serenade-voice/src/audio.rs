//! Microphone capture using CPAL
//!
//! Delivers fixed-size mono chunks, and any stream error the device reports,
//! to a channel from the device callbacks.

use crate::error::{VoiceError, VoiceResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam::channel::Sender;
use tracing::{debug, info, warn};

/// Capture format
#[derive(Debug, Clone)]
pub struct CaptureFormat {
    /// Sample rate in Hz (default: 16000)
    pub sample_rate: u32,

    /// Samples per chunk (default: 480, i.e. 30ms at 16kHz)
    pub chunk_size: usize,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_size: 480,
        }
    }
}

impl CaptureFormat {
    /// 30ms chunks at the given rate, the frame size VAD expects.
    pub fn for_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            chunk_size: (sample_rate as usize * 30) / 1000,
        }
    }
}

/// One chunk of mono PCM, normalized to -1.0..1.0
pub type AudioChunk = Vec<f32>;

/// What the capture callbacks deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureFeed {
    Chunk(AudioChunk),
    /// The device reported a stream error; no further chunks should be expected.
    Fault(String),
}

/// Default-input-device capture
pub struct AudioCapture {
    format: CaptureFormat,
    device: Device,
    stream_config: StreamConfig,
}

impl AudioCapture {
    /// Open the default input device
    pub fn open(format: CaptureFormat) -> VoiceResult<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| VoiceError::Unavailable("no input device available".to_string()))?;

        info!(
            "🎤 Input device: {} ({}Hz mono)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            format.sample_rate
        );

        let default_config = device.default_input_config()?;
        debug!("Default input config: {:?}", default_config);

        let stream_config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            format,
            device,
            stream_config,
        })
    }

    /// Whether the host exposes any input device at all.
    pub fn has_input_device() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    /// Start streaming into `feed`. Dropping the returned stream stops capture.
    pub fn start(self, feed: Sender<CaptureFeed>) -> VoiceResult<Stream> {
        let chunk_size = self.format.chunk_size;
        let fault_tx = feed.clone();
        let mut pending: Vec<f32> = Vec::with_capacity(chunk_size);

        let stream = self.device.build_input_stream(
            &self.stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    pending.push(sample);
                    if pending.len() >= chunk_size {
                        let chunk = std::mem::replace(&mut pending, Vec::with_capacity(chunk_size));
                        // Receiver gone means the session ended; the stream is about to drop.
                        if feed.send(CaptureFeed::Chunk(chunk)).is_err() {
                            return;
                        }
                    }
                }
            },
            move |err| {
                warn!("Audio stream error: {}", err);
                if fault_tx.send(CaptureFeed::Fault(err.to_string())).is_err() {
                    debug!("Stream error after the session ended");
                }
            },
            None,
        )?;

        stream.play()?;
        info!("▶️ Capture started");
        Ok(stream)
    }

    /// Names of all input devices
    pub fn list_input_devices() -> VoiceResult<Vec<String>> {
        let devices = cpal::default_host().input_devices()?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_is_thirty_milliseconds() {
        assert_eq!(CaptureFormat::default().chunk_size, 480);
        assert_eq!(CaptureFormat::for_rate(16000).chunk_size, 480);
        assert_eq!(CaptureFormat::for_rate(48000).chunk_size, 1440);
    }

    #[test]
    #[ignore] // Needs an audio host
    fn list_devices() {
        if let Ok(devices) = AudioCapture::list_input_devices() {
            println!("Available input devices: {:?}", devices);
        }
    }
}
