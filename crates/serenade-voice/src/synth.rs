//! Melody data and tone rendering.
//!
//! A [`Tone`] is a sine partial placed on the graph's absolute timeline with
//! an [`Envelope`]: linear attack to the peak, then two exponential decay
//! stages ending at 0.001 so notes never click off. [`ToneSource`] renders a
//! tone as a rodio `Source`; [`FeedbackEcho`] adds the delay/feedback tail.

use rodio::Source;
use std::f32::consts::TAU;
use std::time::Duration;

/// Output rate of rendered tones.
pub const SAMPLE_RATE: u32 = 44_100;

/// Level at which a decaying note is considered silent.
pub const SILENCE: f32 = 0.001;

pub const BASE_GAIN: f32 = 0.15;
pub const HARMONY_GAIN: f32 = 0.06;
pub const OCTAVE_GAIN: f32 = 0.04;
pub const HARMONY_RATIO: f32 = 1.5;
pub const OCTAVE_RATIO: f32 = 2.0;
/// Octave partials enter this long after their note.
pub const OCTAVE_OFFSET_SECS: f64 = 0.1;
pub const OCTAVE_LENGTH: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub name: &'static str,
    pub frequency: f32,
    /// Seconds until the next note starts.
    pub duration: f32,
}

const fn note(name: &'static str, frequency: f32, duration: f32) -> Note {
    Note {
        name,
        frequency,
        duration,
    }
}

pub const MELODY: [Note; 16] = [
    note("C5", 523.25, 0.4),
    note("E5", 659.25, 0.4),
    note("G5", 783.99, 0.6),
    note("E5", 659.25, 0.4),
    note("F5", 698.46, 0.4),
    note("A5", 880.00, 0.4),
    note("C6", 1046.50, 0.8),
    note("A5", 880.00, 0.4),
    note("G5", 783.99, 0.4),
    note("E5", 659.25, 0.4),
    note("D5", 587.33, 0.6),
    note("G5", 783.99, 0.6),
    note("C5", 523.25, 0.4),
    note("E5", 659.25, 0.4),
    note("G5", 783.99, 0.4),
    note("C6", 1046.50, 1.0),
];

/// Rising C-major arpeggio played on unlock.
pub const CHIME: [f32; 4] = [523.25, 659.25, 783.99, 1046.50];
pub const CHIME_STEP_SECS: f64 = 0.12;
pub const CHIME_NOTE_SECS: f32 = 0.5;
pub const CHIME_GAIN: f32 = 0.12;

/// Length of one full melody pass in seconds.
pub fn pass_length() -> f64 {
    MELODY.iter().map(|n| n.duration as f64).sum()
}

/// A single partial on the absolute timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    /// Absolute graph time, seconds.
    pub start: f64,
    pub duration: f32,
    pub peak: f32,
}

impl Tone {
    pub fn end(&self) -> f64 {
        self.start + self.duration as f64
    }
}

/// The tones of note `index` of [`MELODY`] starting at `start`.
///
/// Every 3rd note carries a harmony partial and every 4th an octave partial.
pub fn voice_note(index: usize, note: &Note, start: f64) -> Vec<Tone> {
    let mut tones = vec![Tone {
        frequency: note.frequency,
        start,
        duration: note.duration,
        peak: BASE_GAIN,
    }];
    if index % 3 == 0 {
        tones.push(Tone {
            frequency: note.frequency * HARMONY_RATIO,
            start,
            duration: note.duration,
            peak: HARMONY_GAIN,
        });
    }
    if index % 4 == 0 {
        tones.push(Tone {
            frequency: note.frequency * OCTAVE_RATIO,
            start: start + OCTAVE_OFFSET_SECS,
            duration: note.duration * OCTAVE_LENGTH,
            peak: OCTAVE_GAIN,
        });
    }
    tones
}

/// Attack / two-stage exponential decay gain curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    peak: f32,
    attack: f32,
    knee: f32,
    knee_level: f32,
    duration: f32,
}

impl Envelope {
    pub fn new(peak: f32, duration: f32) -> Self {
        let attack = (duration * 0.25).min(0.02);
        Self {
            peak,
            attack,
            knee: attack + (duration - attack) * 0.3,
            knee_level: peak * 0.3,
            duration,
        }
    }

    /// Gain `t` seconds after the tone starts.
    pub fn gain_at(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.duration {
            0.0
        } else if t < self.attack {
            self.peak * t / self.attack
        } else if t < self.knee {
            exp_ramp(self.peak, self.knee_level, (t - self.attack) / (self.knee - self.attack))
        } else {
            exp_ramp(self.knee_level, SILENCE, (t - self.knee) / (self.duration - self.knee))
        }
    }
}

fn exp_ramp(from: f32, to: f32, progress: f32) -> f32 {
    from * (to / from).powf(progress.clamp(0.0, 1.0))
}

/// Renders one tone as mono samples.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f32,
    envelope: Envelope,
    gain: f32,
    index: u64,
    total: u64,
}

impl ToneSource {
    pub fn new(tone: &Tone, gain: f32) -> Self {
        Self {
            frequency: tone.frequency,
            envelope: Envelope::new(tone.peak, tone.duration),
            gain,
            index: 0,
            total: (tone.duration * SAMPLE_RATE as f32) as u64,
        }
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total {
            return None;
        }
        let t = self.index as f32 / SAMPLE_RATE as f32;
        self.index += 1;
        Some((TAU * self.frequency * t).sin() * self.envelope.gain_at(t) * self.gain)
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(self.total as f32 / SAMPLE_RATE as f32))
    }
}

/// Echo parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoShape {
    pub delay_secs: f32,
    pub feedback: f32,
    pub mix: f32,
}

impl From<&serenade_core::AudioSettings> for EchoShape {
    fn from(s: &serenade_core::AudioSettings) -> Self {
        Self {
            delay_secs: s.echo_delay_secs,
            feedback: s.echo_feedback,
            mix: s.echo_mix,
        }
    }
}

/// Delay line with feedback around a mono source.
///
/// Keeps producing the echo tail after the inner source ends, until the tail
/// has decayed below [`SILENCE`].
pub struct FeedbackEcho<S> {
    inner: S,
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    mix: f32,
    tail_left: usize,
    inner_done: bool,
}

impl<S: Source<Item = f32>> FeedbackEcho<S> {
    pub fn new(inner: S, shape: EchoShape) -> Self {
        let len = ((shape.delay_secs * inner.sample_rate() as f32) as usize).max(1);
        let repeats = if shape.feedback > 0.0 {
            (SILENCE.ln() / shape.feedback.ln()).ceil().max(1.0) as usize
        } else {
            1
        };
        Self {
            inner,
            buffer: vec![0.0; len],
            pos: 0,
            feedback: shape.feedback,
            mix: shape.mix,
            tail_left: len * repeats,
            inner_done: false,
        }
    }
}

impl<S: Source<Item = f32>> Iterator for FeedbackEcho<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let dry = if self.inner_done {
            None
        } else {
            let sample = self.inner.next();
            self.inner_done = sample.is_none();
            sample
        };
        let input = match dry {
            Some(s) => s,
            None if self.tail_left > 0 => {
                self.tail_left -= 1;
                0.0
            }
            None => return None,
        };

        let delayed = self.buffer[self.pos];
        self.buffer[self.pos] = input + delayed * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        Some(input + delayed * self.mix)
    }
}

impl<S: Source<Item = f32>> Source for FeedbackEcho<S> {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
