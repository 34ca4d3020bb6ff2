//! Platform speech capture.
//!
//! A [`SpeechCapability`] runs one capture session at a time and reports its
//! progress as [`CaptureSignal`]s. The microphone implementation captures via
//! CPAL, classifies 30ms frames with WebRTC VAD, waits for the 800ms gap and
//! transcribes the committed utterance on a helper thread. Every session ends
//! in exactly one outcome, even when the device goes quiet or faults. The adapter in
//! [`crate::adapter`] turns these raw signals into the ordered event contract
//! the orchestrator relies on.

use crate::audio::{AudioCapture, CaptureFeed, CaptureFormat};
use crate::error::{VoiceError, VoiceResult};
use crate::stt::SttBackend;
use crate::turn::{TurnConfig, TurnEvent, TurnManager};
use crate::vad::{VadConfig, VadDetector};
use cpal::Stream;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use serenade_core::VoiceSettings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Raw progress of a capture session. Backends may emit these out of order;
/// the adapter normalizes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSignal {
    Started,
    Transcript(String),
    Failed(String),
}

/// A platform's one-shot speech recognizer.
pub trait SpeechCapability {
    /// Whether capture can work at all on this host.
    fn is_available(&self) -> bool;

    /// Begin a session, replacing any previous one.
    fn begin(&mut self) -> VoiceResult<()>;

    /// Abort the current session. Signals already queued for it are dropped.
    fn abort(&mut self);

    /// Next signal of the current session, if any. Never blocks.
    fn poll(&mut self) -> Option<CaptureSignal>;
}

struct MicSession {
    _stream: Stream,
    signals: mpsc::UnboundedReceiver<CaptureSignal>,
    cancelled: Arc<AtomicBool>,
}

impl Drop for MicSession {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Microphone + VAD + STT recognizer.
pub struct MicrophoneSpeech {
    settings: VoiceSettings,
    stt: Arc<dyn SttBackend>,
    available: bool,
    session: Option<MicSession>,
}

impl MicrophoneSpeech {
    /// Probe the host once. Disabled settings or a missing input device make the
    /// capability unavailable.
    pub fn new(settings: VoiceSettings, stt: Arc<dyn SttBackend>) -> Self {
        let available = settings.enabled && AudioCapture::has_input_device();
        info!(
            "🎤 Microphone speech {} (STT: {})",
            if available { "available" } else { "unavailable" },
            stt.name()
        );
        Self {
            settings,
            stt,
            available,
            session: None,
        }
    }
}

impl SpeechCapability for MicrophoneSpeech {
    fn is_available(&self) -> bool {
        self.available
    }

    fn begin(&mut self) -> VoiceResult<()> {
        if !self.available {
            return Err(VoiceError::Unavailable("microphone speech capture".to_string()));
        }
        self.session = None;

        let format = CaptureFormat::for_rate(self.settings.sample_rate);
        let capture = AudioCapture::open(format)?;
        let (feed_tx, feed_rx) = channel::unbounded();
        let stream = capture.start(feed_tx)?;

        let (signal_tx, signals) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        // The stream is live; the session has started.
        if signal_tx.send(CaptureSignal::Started).is_err() {
            debug!("Session receiver gone before start");
        }

        let worker = SessionWorker {
            sample_rate: self.settings.sample_rate,
            turn: TurnConfig {
                gap: Duration::from_millis(self.settings.gap_ms),
                min_speech: Duration::from_millis(self.settings.min_speech_ms),
                ..Default::default()
            },
            listen_timeout: self.settings.listen_timeout(),
            stt: Arc::clone(&self.stt),
            cancelled: Arc::clone(&cancelled),
        };
        thread::spawn(move || worker.run(feed_rx, signal_tx));

        self.session = Some(MicSession {
            _stream: stream,
            signals,
            cancelled,
        });
        Ok(())
    }

    fn abort(&mut self) {
        if self.session.take().is_some() {
            debug!("Microphone session aborted");
        }
    }

    fn poll(&mut self) -> Option<CaptureSignal> {
        self.session.as_mut()?.signals.try_recv().ok()
    }
}

/// VAD + gap + STT for one session, on its own thread.
struct SessionWorker {
    sample_rate: u32,
    turn: TurnConfig,
    listen_timeout: Duration,
    stt: Arc<dyn SttBackend>,
    cancelled: Arc<AtomicBool>,
}

impl SessionWorker {
    fn run(self, feed: Receiver<CaptureFeed>, signals: mpsc::UnboundedSender<CaptureSignal>) {
        let outcome = self.listen(&feed);
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }
        let signal = match outcome {
            Ok(text) => CaptureSignal::Transcript(text),
            Err(reason) => CaptureSignal::Failed(reason),
        };
        if signals.send(signal).is_err() {
            debug!("Session ended before its outcome was read");
        }
    }

    fn listen(&self, feed: &Receiver<CaptureFeed>) -> Result<String, String> {
        // VAD state is not Send; build it on this thread.
        let mut vad = VadDetector::new(VadConfig {
            sample_rate: self.sample_rate,
            ..Default::default()
        })
        .map_err(|e| {
            error!("VAD init failed: {}", e);
            e.to_string()
        })?;
        let mut turns = TurnManager::new(self.turn.clone());
        let deadline = Instant::now() + self.listen_timeout;

        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err("aborted".to_string());
            }
            let now = Instant::now();
            if now >= deadline && turns.is_idle() {
                info!("⌛ No speech before the listen timeout");
                return Err("no speech detected".to_string());
            }

            // Idle: wake at the deadline. Mid-utterance: a full timeout of silence
            // from the device means it stalled.
            let wait = if turns.is_idle() {
                deadline.saturating_duration_since(now)
            } else {
                self.listen_timeout
            };

            let chunk = match feed.recv_timeout(wait) {
                Ok(CaptureFeed::Chunk(chunk)) => chunk,
                Ok(CaptureFeed::Fault(reason)) => {
                    warn!("Capture fault: {}", reason);
                    return Err(format!("audio capture failed: {}", reason));
                }
                Err(RecvTimeoutError::Timeout) if turns.is_idle() => continue,
                Err(RecvTimeoutError::Timeout) => {
                    warn!("No audio from the device for {:?}", wait);
                    return Err("audio capture stalled".to_string());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err("audio capture ended".to_string());
                }
            };

            let is_speech = match vad.is_speech(&chunk) {
                Ok(v) => v,
                Err(e) => {
                    debug!("Skipping frame: {}", e);
                    continue;
                }
            };

            match turns.process(is_speech, &chunk, Instant::now()) {
                Some(TurnEvent::Committed { samples, .. }) => {
                    return match self.stt.transcribe(&samples, self.sample_rate) {
                        Ok(text) if text.trim().is_empty() => {
                            Err("no speech recognized".to_string())
                        }
                        Ok(text) => Ok(text),
                        Err(e) => {
                            warn!("Transcription failed: {}", e);
                            Err(e.to_string())
                        }
                    };
                }
                Some(TurnEvent::SpeechStarted) => debug!("Speech detected"),
                Some(TurnEvent::Dropped { .. }) | None => {}
            }
        }
    }
}
