//! Stage Orchestrator - the controller that owns the session
//!
//! Feeds events through [`step`], applies the resulting effects to the
//! scheduler and collaborators, and renders a [`Frame`] after each event.
//! Time only advances through [`Orchestrator::advance_to`], so hosts drive it
//! from a wall clock and tests drive it by hand.

use crate::capability::{AmbientAudio, RenderSurface, VoiceEvent, VoiceInput};
use crate::celebration::{CelebrationTrigger, Particle};
use crate::clock::{Scheduler, TimerHandle};
use crate::config::SerenadeConfig;
use crate::letter::Letter;
use crate::matcher::PhraseMatcher;
use crate::proposal::{EvasiveControl, Position, ProposalPhase};
use crate::stage::{step, Effect, Event, Rules, SessionState, Stage, TimerKind, Transition};
use crate::surface::Frame;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a scheduler entry does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheduled {
    Stage(TimerKind),
    SpawnParticle(u32),
    ExpireParticle(u32),
}

/// The single controller of one session.
pub struct Orchestrator<V: VoiceInput, A: AmbientAudio, R: RenderSurface> {
    rules: Rules,
    letter: Letter,
    state: SessionState,

    scheduler: Scheduler<Scheduled>,
    timers: HashMap<TimerKind, TimerHandle>,

    // Collaborators
    voice: V,
    audio: A,
    surface: R,

    evasive: EvasiveControl,
    celebration: CelebrationTrigger,
    // planned or on screen, keyed by id
    particles: HashMap<u32, Particle>,
    rng: StdRng,

    last_frame: Option<Frame>,
    torn_down: bool,
}

impl<V: VoiceInput, A: AmbientAudio, R: RenderSurface> Orchestrator<V, A, R> {
    /// Create an orchestrator at the lock stage and draw the first frame.
    pub fn new(config: &SerenadeConfig, voice: V, audio: A, surface: R) -> Self {
        let letter = Letter::default();
        let speech_supported = voice.is_supported();
        if !speech_supported {
            info!("🎙️ Speech capture unavailable; typed fallback enabled");
        }

        let mut orchestrator = Self {
            rules: Rules {
                timings: config.timings.clone(),
                matcher: PhraseMatcher::default(),
                paragraph_count: letter.paragraph_count(),
            },
            state: SessionState::new(letter.paragraph_count(), speech_supported),
            letter,
            scheduler: Scheduler::new(),
            timers: HashMap::new(),
            voice,
            audio,
            surface,
            evasive: EvasiveControl,
            celebration: CelebrationTrigger::new(config.celebration.clone()),
            particles: HashMap::new(),
            rng: StdRng::from_entropy(),
            last_frame: None,
            torn_down: false,
        };
        orchestrator.render();
        orchestrator
    }

    /// Replace the letter. Only meaningful before the letter stage is entered.
    pub fn with_letter(mut self, letter: Letter) -> Self {
        self.rules.paragraph_count = letter.paragraph_count();
        self.state.reveal = crate::letter::RevealProgress::new(letter.paragraph_count());
        self.letter = letter;
        self.render();
        self
    }

    /// Replace the accepted phrase set.
    pub fn with_matcher(mut self, matcher: PhraseMatcher) -> Self {
        self.rules.matcher = matcher;
        self
    }

    /// Use a fixed random source (evasive moves, celebration layout).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn letter(&self) -> &Letter {
        &self.letter
    }

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Logical time of the next timer, if any is armed.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Armed timers, including celebration units.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Stage timer of `kind` currently armed.
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.timers
            .get(&kind)
            .is_some_and(|h| self.scheduler.is_pending(*h))
    }

    /// Celebration units planned or on screen.
    pub fn live_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut V {
        &mut self.voice
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ---------------------------------------------------------------------
    // User actions
    // ---------------------------------------------------------------------

    /// Tap on the lock prompt.
    pub fn tap(&mut self) {
        self.dispatch(Event::Tap);
    }

    /// Typed fallback entry. Always accepted on the lock prompt.
    pub fn submit_text(&mut self, text: impl Into<String>) {
        self.dispatch(Event::Typed(text.into()));
    }

    /// Music on/off in the letter stage.
    pub fn toggle_audio(&mut self) {
        self.dispatch(Event::ToggleAudio);
    }

    /// "Continue" on a fully revealed letter.
    pub fn continue_reading(&mut self) {
        self.dispatch(Event::Continue);
    }

    /// Tap on the proposal hint.
    pub fn reveal_declaration(&mut self) {
        self.dispatch(Event::RevealDeclaration);
    }

    pub fn accept(&mut self) {
        self.dispatch(Event::Accept);
    }

    /// Activate the evasive control. Returns where it ran to, if it was live.
    pub fn evade(&mut self) -> Option<Position> {
        let live = self.state.stage == Stage::Proposal
            && self.state.proposal.phase == ProposalPhase::Decision;
        if !live || self.torn_down {
            debug!("evasive control not live");
            return None;
        }
        let to = self.evasive.relocate(self.state.proposal.evasive, &mut self.rng);
        self.dispatch(Event::Evade(to));
        Some(to)
    }

    // ---------------------------------------------------------------------
    // Driving
    // ---------------------------------------------------------------------

    /// Drain pending capture events into the stage machine.
    pub fn poll_voice(&mut self) {
        while !self.torn_down {
            let Some(event) = self.voice.poll_event() else {
                break;
            };
            let event = match event {
                VoiceEvent::Started => Event::ListeningStarted,
                VoiceEvent::Result(transcript) => Event::Heard(transcript),
                VoiceEvent::Error(reason) => Event::RecognitionFailed(reason),
            };
            self.dispatch(event);
        }
    }

    /// Advance logical time by `by`.
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now() + by;
        self.advance_to(target);
    }

    /// Fire every timer due up to `target`, in deadline order.
    pub fn advance_to(&mut self, target: Duration) {
        if self.torn_down {
            return;
        }
        self.poll_voice();

        while let Some(fired) = self.scheduler.pop_due(target) {
            match fired.task {
                Scheduled::Stage(kind) => {
                    if !fired.repeating && self.timers.get(&kind) == Some(&fired.handle) {
                        self.timers.remove(&kind);
                    }
                    self.dispatch(Event::Timer(kind));
                }
                Scheduled::SpawnParticle(id) => self.spawn_particle(id),
                Scheduled::ExpireParticle(id) => self.expire_particle(id),
            }
        }
        self.scheduler.settle(target);

        self.audio.service();
        self.poll_voice();
    }

    /// Feed one event through the stage machine and apply its effects.
    pub fn dispatch(&mut self, event: Event) {
        if self.torn_down {
            debug!(?event, "event after teardown ignored");
            return;
        }

        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let Transition { state, effects } = step(&self.state, event, &self.rules);
            let left = (state.stage != self.state.stage).then_some(self.state.stage);
            self.state = state;

            for effect in effects {
                self.apply(effect, &mut queue);
            }
            if let Some(stage) = left {
                self.cancel_owned_by(stage);
            }
        }
        self.render();
    }

    /// Cancel every timer, stop capture and audio, and release the audio session.
    /// Nothing fires and no event is processed afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.scheduler.cancel_all();
        self.timers.clear();
        self.particles.clear();
        self.voice.stop_listening();
        self.audio.stop();
        self.audio.release();
        self.torn_down = true;
        info!(cancelled, stage = ?self.state.stage, "🛑 Orchestrator torn down");
    }

    fn apply(&mut self, effect: Effect, queue: &mut VecDeque<Event>) {
        match effect {
            Effect::StartTimer { kind, delay } => {
                self.cancel_timer(kind);
                let handle = self.scheduler.schedule_once(delay, Scheduled::Stage(kind));
                self.timers.insert(kind, handle);
            }
            Effect::StartInterval { kind, period } => {
                self.cancel_timer(kind);
                let handle = self.scheduler.schedule_every(period, Scheduled::Stage(kind));
                self.timers.insert(kind, handle);
            }
            Effect::CancelTimer(kind) => self.cancel_timer(kind),
            Effect::StartListening => {
                if let Err(e) = self.voice.start_listening() {
                    warn!(error = %e, "could not start listening");
                    queue.push_back(Event::RecognitionFailed(e.to_string()));
                }
            }
            Effect::StopListening => self.voice.stop_listening(),
            Effect::PlayChime => {
                if let Err(e) = self.audio.chime() {
                    warn!(error = %e, "unlock chime failed");
                }
            }
            Effect::PlayAudio => {
                if let Err(e) = self.audio.play() {
                    warn!(error = %e, "ambient loop stays idle");
                }
            }
            Effect::StopAudio => self.audio.stop(),
            Effect::ToggleAudio => {
                if let Err(e) = self.audio.toggle() {
                    warn!(error = %e, "music toggle failed");
                }
            }
            Effect::Celebrate => self.launch_celebration(),
        }
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        if let Some(handle) = self.timers.remove(&kind) {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_owned_by(&mut self, stage: Stage) {
        let owned: Vec<TimerKind> = self
            .timers
            .keys()
            .copied()
            .filter(|k| k.owner() == stage)
            .collect();
        for kind in owned {
            debug!(?kind, ?stage, "cancelling timer of exited stage");
            self.cancel_timer(kind);
        }
    }

    fn launch_celebration(&mut self) {
        let burst = self.celebration.burst(&mut self.rng);
        info!(units = burst.len(), "🎆 Celebration burst");
        for particle in burst {
            self.scheduler
                .schedule_once(particle.offset, Scheduled::SpawnParticle(particle.id));
            self.particles.insert(particle.id, particle);
        }
    }

    fn spawn_particle(&mut self, id: u32) {
        let Some(particle) = self.particles.get(&id) else {
            return;
        };
        let lifetime = particle.lifetime;
        match self.surface.spawn_particle(particle) {
            Ok(()) => {
                self.scheduler
                    .schedule_once(lifetime, Scheduled::ExpireParticle(id));
            }
            Err(e) => {
                debug!(id, error = %e, "celebration unit skipped");
                self.particles.remove(&id);
            }
        }
    }

    fn expire_particle(&mut self, id: u32) {
        if self.particles.remove(&id).is_some() {
            if let Err(e) = self.surface.remove_particle(id) {
                debug!(id, error = %e, "celebration unit removal failed");
            }
        }
    }

    fn render(&mut self) {
        let frame = Frame::compose(&self.state, &self.letter, self.audio.is_playing());
        if self.last_frame.as_ref() == Some(&frame) {
            return;
        }
        if let Err(e) = self.surface.render(&frame) {
            warn!(error = %e, "render failed");
        }
        self.last_frame = Some(frame);
    }
}

impl<V: VoiceInput, A: AmbientAudio, R: RenderSurface> Drop for Orchestrator<V, A, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
