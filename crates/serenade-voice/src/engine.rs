//! Ambient melody loop
//!
//! ```text
//!   Idle ──play──► Starting ──resume ok──► Looping ──stop──► Stopped
//!                     │                       ▲                 │
//!                     └──resume failed──► Idle └───────play─────┘
//! ```
//!
//! Each pass lays the whole melody onto the graph clock, then arms a single
//! re-arm timer at the pass end. The timer carries the play generation that
//! armed it; a timer from an older generation, or one firing while not
//! Looping, schedules nothing. At most one re-arm timer is armed at a time.
//! A re-arm serviced more than a full pass late starts the next pass at the
//! current graph time.

use crate::graph::SynthGraph;
use crate::synth::{
    pass_length, voice_note, Tone, CHIME, CHIME_GAIN, CHIME_NOTE_SECS, CHIME_STEP_SECS, MELODY,
};
use serenade_core::{AmbientAudio, Scheduler, SerenadeError, SerenadeResult, TimerHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Starting,
    Looping,
    Stopped,
}

/// Owns the synthesis graph for the whole session.
pub struct AudioLoopEngine<G: SynthGraph> {
    graph: G,
    state: LoopState,
    generation: u64,
    rearm: Scheduler<u64>,
    armed: Option<TimerHandle>,
    passes: usize,
    released: bool,
}

fn graph_instant(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.0))
}

impl<G: SynthGraph> AudioLoopEngine<G> {
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            state: LoopState::Idle,
            generation: 0,
            rearm: Scheduler::new(),
            armed: None,
            passes: 0,
            released: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Re-arm timers currently pending (0 or 1).
    pub fn armed_passes(&self) -> usize {
        self.rearm.pending()
    }

    /// Passes laid onto the graph since construction.
    pub fn passes_scheduled(&self) -> usize {
        self.passes
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn ensure_resumed(&mut self) -> SerenadeResult<()> {
        if self.released {
            return Err(SerenadeError::ResumeFailure("audio session released".to_string()));
        }
        if self.graph.is_suspended() {
            self.graph.resume().map_err(|e| {
                warn!("⚠️ Audio resume failed: {}", e);
                SerenadeError::ResumeFailure(e.to_string())
            })?;
        }
        Ok(())
    }

    fn emit(&mut self, tone: Tone) {
        if let Err(e) = self.graph.schedule(tone) {
            warn!("Dropped tone at {:.2}s: {}", tone.start, e);
        }
    }

    /// Lay one melody pass starting at `start` and arm the re-arm timer at its end.
    fn schedule_pass(&mut self, start: f64) {
        let mut at = start;
        for (i, note) in MELODY.iter().enumerate() {
            for tone in voice_note(i, note, at) {
                self.emit(tone);
            }
            at += note.duration as f64;
        }
        self.passes += 1;

        let now = graph_instant(self.graph.current_time());
        self.rearm.settle(now);
        let end = graph_instant(start + pass_length());
        if let Some(old) = self.armed.take() {
            self.rearm.cancel(old);
        }
        self.armed = Some(
            self.rearm
                .schedule_once(end.saturating_sub(now), self.generation),
        );
        debug!(pass = self.passes, start, "melody pass scheduled");
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.armed.take() {
            self.rearm.cancel(handle);
        }
    }
}

impl<G: SynthGraph> AmbientAudio for AudioLoopEngine<G> {
    fn play(&mut self) -> SerenadeResult<()> {
        if self.state == LoopState::Looping {
            return Ok(());
        }
        self.state = LoopState::Starting;
        if let Err(e) = self.ensure_resumed() {
            self.state = LoopState::Idle;
            return Err(e);
        }

        self.generation += 1;
        self.state = LoopState::Looping;
        self.disarm();
        let start = self.graph.current_time();
        info!("🎵 Ambient loop started");
        self.schedule_pass(start);
        Ok(())
    }

    fn stop(&mut self) {
        if matches!(self.state, LoopState::Looping | LoopState::Starting) {
            self.state = LoopState::Stopped;
            info!("⏹️ Ambient loop stopped");
        }
        self.disarm();
    }

    fn is_playing(&self) -> bool {
        self.state == LoopState::Looping
    }

    fn chime(&mut self) -> SerenadeResult<()> {
        self.ensure_resumed()?;
        let start = self.graph.current_time();
        for (i, &frequency) in CHIME.iter().enumerate() {
            self.emit(Tone {
                frequency,
                start: start + i as f64 * CHIME_STEP_SECS,
                duration: CHIME_NOTE_SECS,
                peak: CHIME_GAIN,
            });
        }
        Ok(())
    }

    fn service(&mut self) {
        if self.released {
            return;
        }
        let now = graph_instant(self.graph.current_time());
        while let Some(fired) = self.rearm.pop_due(now) {
            if self.armed == Some(fired.handle) {
                self.armed = None;
            }
            if self.state == LoopState::Looping && fired.task == self.generation {
                let mut start = fired.at.as_secs_f64();
                let current = now.as_secs_f64();
                // A whole pass already elapsed unserviced; laying it in the past
                // would sound every note at once.
                if start + pass_length() < current {
                    warn!(late_secs = current - start, "melody pass restarted at current time");
                    start = current;
                }
                self.schedule_pass(start);
            } else {
                debug!(generation = fired.task, "stale re-arm ignored");
            }
        }
        self.rearm.settle(now);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.disarm();
        self.rearm.cancel_all();
        self.state = LoopState::Stopped;
        self.graph.close();
        self.released = true;
        info!("🔇 Audio session released");
    }
}

impl<G: SynthGraph> Drop for AudioLoopEngine<G> {
    fn drop(&mut self) {
        self.release();
    }
}
