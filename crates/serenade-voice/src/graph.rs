//! Synthesis graphs: where scheduled tones actually go.
//!
//! A graph starts suspended and owns an absolute clock in seconds. The engine
//! resumes it, then schedules tones against that clock. [`RodioGraph`] plays
//! them on the default output device; [`RecordingGraph`] records them and lets
//! a [`GraphProbe`] move its clock by hand.

use crate::error::{VoiceError, VoiceResult};
use crate::synth::{EchoShape, FeedbackEcho, Tone, ToneSource};
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub trait SynthGraph {
    /// Seconds on the graph's clock.
    fn current_time(&self) -> f64;

    fn is_suspended(&self) -> bool;

    fn resume(&mut self) -> VoiceResult<()>;

    /// Queue a tone at `tone.start` on the graph clock. Past starts play now.
    fn schedule(&mut self, tone: Tone) -> VoiceResult<()>;

    /// Tear the graph down. Scheduled tones are cut.
    fn close(&mut self);
}

/// Default output device via rodio. The device is opened on first resume.
pub struct RodioGraph {
    output: Option<(OutputStream, OutputStreamHandle)>,
    epoch: Instant,
    echo: EchoShape,
    master_gain: f32,
}

impl RodioGraph {
    pub fn new(settings: &serenade_core::AudioSettings) -> Self {
        Self {
            output: None,
            epoch: Instant::now(),
            echo: EchoShape::from(settings),
            master_gain: settings.master_gain,
        }
    }
}

impl SynthGraph for RodioGraph {
    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn is_suspended(&self) -> bool {
        self.output.is_none()
    }

    fn resume(&mut self) -> VoiceResult<()> {
        if self.output.is_some() {
            return Ok(());
        }
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| VoiceError::Playback(e.to_string()))?;
        info!("🔊 Audio output opened");
        self.output = Some((stream, handle));
        Ok(())
    }

    fn schedule(&mut self, tone: Tone) -> VoiceResult<()> {
        let (_, handle) = self
            .output
            .as_ref()
            .ok_or_else(|| VoiceError::Playback("audio output suspended".to_string()))?;
        let wait = (tone.start - self.current_time()).max(0.0);
        let source = FeedbackEcho::new(ToneSource::new(&tone, self.master_gain), self.echo)
            .delay(Duration::from_secs_f64(wait));
        handle
            .play_raw(source)
            .map_err(|e| VoiceError::Playback(e.to_string()))
    }

    fn close(&mut self) {
        if self.output.take().is_some() {
            debug!("Audio output closed");
        }
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    time: f64,
    suspended: bool,
    fail_resume: Option<String>,
    resumes: usize,
    tones: Vec<Tone>,
    closes: usize,
}

/// In-memory graph that records what it is asked to play.
#[derive(Debug)]
pub struct RecordingGraph {
    state: Rc<RefCell<ProbeState>>,
}

/// Test-side view of a [`RecordingGraph`].
#[derive(Debug, Clone)]
pub struct GraphProbe {
    state: Rc<RefCell<ProbeState>>,
}

impl RecordingGraph {
    /// A suspended graph at time zero, plus its probe.
    pub fn new() -> (Self, GraphProbe) {
        let state = Rc::new(RefCell::new(ProbeState {
            suspended: true,
            ..Default::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            GraphProbe { state },
        )
    }
}

impl SynthGraph for RecordingGraph {
    fn current_time(&self) -> f64 {
        self.state.borrow().time
    }

    fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }

    fn resume(&mut self) -> VoiceResult<()> {
        let mut s = self.state.borrow_mut();
        if let Some(reason) = s.fail_resume.clone() {
            return Err(VoiceError::Playback(reason));
        }
        s.suspended = false;
        s.resumes += 1;
        Ok(())
    }

    fn schedule(&mut self, tone: Tone) -> VoiceResult<()> {
        let mut s = self.state.borrow_mut();
        if s.suspended {
            return Err(VoiceError::Playback("graph suspended".to_string()));
        }
        s.tones.push(tone);
        Ok(())
    }

    fn close(&mut self) {
        self.state.borrow_mut().closes += 1;
    }
}

impl GraphProbe {
    pub fn set_time(&self, secs: f64) {
        self.state.borrow_mut().time = secs;
    }

    pub fn advance(&self, secs: f64) {
        self.state.borrow_mut().time += secs;
    }

    /// Make the next resumes fail with `reason`; `None` clears it.
    pub fn fail_resume(&self, reason: Option<&str>) {
        self.state.borrow_mut().fail_resume = reason.map(str::to_string);
    }

    pub fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }

    pub fn resumes(&self) -> usize {
        self.state.borrow().resumes
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.state.borrow().tones.clone()
    }

    /// Tones starting in `[from, to)`.
    pub fn tones_between(&self, from: f64, to: f64) -> Vec<Tone> {
        self.state
            .borrow()
            .tones
            .iter()
            .filter(|t| t.start >= from && t.start < to)
            .copied()
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.state.borrow().closes
    }
}
