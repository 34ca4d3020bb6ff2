//! Integration test: the full Lock → Letter → Proposal flow on a logical clock.
//!
//! ## Scenarios
//! 1. A wrong transcript shows "try again" and returns to the prompt after exactly 3s.
//! 2. "radha radha" enters the letter after exactly 1.5s, once.
//! 3. Recognition errors reset after 2s; start failures surface as errors.
//! 4. Without speech support the typed fallback unlocks.
//! 5. The letter reveals one paragraph per 1.2s and stops at the total.
//! 6. Music starts 0.5s into the letter; toggling it leaves the reveal alone.
//! 7. Leaving the letter stops the music and no letter timer fires afterwards.
//! 8. The evasive control only ever moves; accept commits and celebrates.
//! 9. Teardown silences every timer.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serenade_core::{
    AmbientAudio, Frame, LockView, Orchestrator, Particle, ProposalOutcome, ProposalPhase,
    RenderSurface, SerenadeConfig, SerenadeError, SerenadeResult, Stage, TimerKind, VoiceEvent,
    VoiceInput,
};
use std::collections::VecDeque;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeVoice {
    supported: bool,
    listening: bool,
    starts: u32,
    events: VecDeque<VoiceEvent>,
    fail_start: Option<String>,
}

impl FakeVoice {
    fn supported() -> Self {
        Self {
            supported: true,
            ..Default::default()
        }
    }

    fn unsupported() -> Self {
        Self::default()
    }

    /// Platform delivers a full session: started, then the transcript.
    fn hear(&mut self, transcript: &str) {
        self.events.push_back(VoiceEvent::Started);
        self.events
            .push_back(VoiceEvent::Result(transcript.to_string()));
    }
}

impl VoiceInput for FakeVoice {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start_listening(&mut self) -> SerenadeResult<()> {
        if let Some(reason) = &self.fail_start {
            return Err(SerenadeError::Recognition(reason.clone()));
        }
        if !self.listening {
            self.listening = true;
            self.starts += 1;
        }
        Ok(())
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }

    fn is_listening(&self) -> bool {
        self.listening
    }

    fn poll_event(&mut self) -> Option<VoiceEvent> {
        let event = self.events.pop_front();
        if matches!(event, Some(VoiceEvent::Result(_)) | Some(VoiceEvent::Error(_))) {
            self.listening = false;
        }
        event
    }
}

#[derive(Default)]
struct FakeAudio {
    playing: bool,
    plays: u32,
    stops: u32,
    chimes: u32,
    releases: u32,
    fail_resume: bool,
}

impl AmbientAudio for FakeAudio {
    fn play(&mut self) -> SerenadeResult<()> {
        if self.fail_resume {
            return Err(SerenadeError::ResumeFailure("context suspended".into()));
        }
        if !self.playing {
            self.playing = true;
            self.plays += 1;
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.playing {
            self.stops += 1;
        }
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn chime(&mut self) -> SerenadeResult<()> {
        self.chimes += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

#[derive(Default)]
struct RecordingSurface {
    frames: Vec<Frame>,
    spawned: Vec<u32>,
    removed: Vec<u32>,
    // refuse to draw units whose id is a multiple of this
    refuse_every: Option<u32>,
}

impl RecordingSurface {
    fn last(&self) -> &Frame {
        self.frames.last().expect("at least one frame")
    }

    fn stage_entries(&self, stage: Stage) -> usize {
        self.frames
            .windows(2)
            .filter(|w| w[0].stage != stage && w[1].stage == stage)
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn render(&mut self, frame: &Frame) -> SerenadeResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn spawn_particle(&mut self, particle: &Particle) -> SerenadeResult<()> {
        if let Some(n) = self.refuse_every {
            if particle.id % n == 0 {
                return Err(SerenadeError::Render("canvas busy".into()));
            }
        }
        self.spawned.push(particle.id);
        Ok(())
    }

    fn remove_particle(&mut self, id: u32) -> SerenadeResult<()> {
        self.removed.push(id);
        Ok(())
    }
}

type TestOrchestrator = Orchestrator<FakeVoice, FakeAudio, RecordingSurface>;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn orchestrator(voice: FakeVoice) -> TestOrchestrator {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Orchestrator::new(
        &SerenadeConfig::default(),
        voice,
        FakeAudio::default(),
        RecordingSurface::default(),
    )
    .with_rng(StdRng::seed_from_u64(42))
}

/// Unlock with a typed phrase and wait out the unlock delay.
fn into_letter(o: &mut TestOrchestrator) {
    o.submit_text("radha radha");
    o.advance(ms(1500));
    assert_eq!(o.stage(), Stage::Letter);
}

/// Reveal the whole letter and continue.
fn into_proposal(o: &mut TestOrchestrator) {
    into_letter(o);
    let total = o.state().reveal.total() as u64;
    o.advance(ms(1200 * total));
    o.continue_reading();
    assert_eq!(o.stage(), Stage::Proposal);
}

fn into_decision(o: &mut TestOrchestrator) {
    into_proposal(o);
    o.advance(ms(1000));
    o.reveal_declaration();
    o.advance(ms(2000));
    assert_eq!(o.state().proposal.phase, ProposalPhase::Decision);
}

// ===========================================================================
// Lock
// ===========================================================================

#[test]
fn wrong_transcript_resets_after_exactly_three_seconds() {
    let mut o = orchestrator(FakeVoice::supported());
    o.tap();
    assert_eq!(o.voice().starts, 1);

    o.voice_mut().hear("hello");
    o.poll_voice();
    assert_eq!(o.state().lock, LockView::Misheard("hello".into()));
    assert_eq!(o.surface().last().lock, LockView::Misheard("hello".into()));

    o.advance(ms(2999));
    assert_eq!(o.state().lock, LockView::Misheard("hello".into()));

    o.advance(ms(1));
    assert_eq!(o.state().lock, LockView::Prompt);
    assert_eq!(o.stage(), Stage::Lock);
    assert_eq!(o.pending_timers(), 0);
}

#[test]
fn matching_transcript_enters_letter_once_after_unlock_delay() {
    let mut o = orchestrator(FakeVoice::supported());
    o.tap();
    o.voice_mut().hear("Radha Radha");
    o.poll_voice();

    assert_eq!(o.state().lock, LockView::Unlocked);
    assert_eq!(o.audio().chimes, 1);

    // repeated attempts while unlocking change nothing
    o.submit_text("radha");
    o.tap();
    assert_eq!(o.voice().starts, 1);

    o.advance(ms(1499));
    assert_eq!(o.stage(), Stage::Lock);
    o.advance(ms(1));
    assert_eq!(o.stage(), Stage::Letter);

    o.advance(ms(60_000));
    assert_eq!(o.surface().stage_entries(Stage::Letter), 1);
    assert_eq!(o.audio().chimes, 1);
}

#[test]
fn listening_indicator_follows_started_event() {
    let mut o = orchestrator(FakeVoice::supported());
    o.tap();
    o.voice_mut().events.push_back(VoiceEvent::Started);
    o.poll_voice();
    assert_eq!(o.surface().last().lock, LockView::Listening);

    // a second tap while listening is ignored
    o.tap();
    assert_eq!(o.voice().starts, 1);
}

#[test]
fn recognition_error_resets_after_two_seconds() {
    let mut o = orchestrator(FakeVoice::supported());
    o.tap();
    o.voice_mut().events.push_back(VoiceEvent::Started);
    o.voice_mut()
        .events
        .push_back(VoiceEvent::Error("not-allowed".into()));
    o.poll_voice();
    assert_eq!(o.state().lock, LockView::Error("not-allowed".into()));

    o.advance(ms(1999));
    assert!(matches!(o.state().lock, LockView::Error(_)));
    o.advance(ms(1));
    assert_eq!(o.state().lock, LockView::Prompt);

    // unlimited retries
    o.tap();
    assert_eq!(o.voice().starts, 2);
}

#[test]
fn failing_to_start_capture_shows_error() {
    let mut voice = FakeVoice::supported();
    voice.fail_start = Some("microphone busy".into());
    let mut o = orchestrator(voice);
    o.tap();
    assert!(matches!(o.state().lock, LockView::Error(_)));
    o.advance(ms(2000));
    assert_eq!(o.state().lock, LockView::Prompt);
}

#[test]
fn typed_fallback_without_speech_support() {
    let mut o = orchestrator(FakeVoice::unsupported());
    assert!(o.surface().last().typed_fallback);

    o.tap();
    assert_eq!(o.voice().starts, 0);
    assert_eq!(o.state().lock, LockView::Prompt);

    o.submit_text("I love you");
    assert_eq!(o.state().lock, LockView::Misheard("I love you".into()));
    o.advance(ms(3000));

    o.submit_text("RADHE radhe");
    o.advance(ms(1500));
    assert_eq!(o.stage(), Stage::Letter);
}

// ===========================================================================
// Letter
// ===========================================================================

#[test]
fn reveal_completes_after_count_times_period() {
    let mut o = orchestrator(FakeVoice::supported());
    into_letter(&mut o);
    let total = o.state().reveal.total();
    assert!(total > 0);

    let mut previous = 0;
    for tick in 1..=total {
        o.advance(ms(1199));
        assert_eq!(o.state().reveal.shown(), tick - 1);
        o.advance(ms(1));
        let shown = o.state().reveal.shown();
        assert_eq!(shown, tick);
        assert!(shown >= previous);
        previous = shown;
    }
    assert!(o.state().can_continue());
    assert!(!o.is_armed(TimerKind::RevealTick));

    o.advance(ms(10_000));
    assert_eq!(o.state().reveal.shown(), total);
}

#[test]
fn continue_is_ignored_until_fully_revealed() {
    let mut o = orchestrator(FakeVoice::supported());
    into_letter(&mut o);
    o.advance(ms(1200));
    o.continue_reading();
    assert_eq!(o.stage(), Stage::Letter);
    assert!(!o.surface().last().can_continue);
}

#[test]
fn music_starts_half_a_second_in_and_toggles_independently() {
    let mut o = orchestrator(FakeVoice::supported());
    into_letter(&mut o);

    o.advance(ms(499));
    assert!(!o.audio().playing);
    o.advance(ms(1));
    assert!(o.audio().playing);
    assert!(o.surface().last().music_playing);

    o.toggle_audio();
    assert!(!o.audio().playing);
    assert!(!o.surface().last().music_playing);

    // reveal keeps ticking while paused
    o.advance(ms(700));
    assert_eq!(o.state().reveal.shown(), 1);

    o.toggle_audio();
    assert!(o.audio().playing);
    assert_eq!(o.audio().plays, 2);
}

#[test]
fn pause_before_auto_start_is_respected() {
    let mut o = orchestrator(FakeVoice::supported());
    into_letter(&mut o);

    o.advance(ms(200));
    o.toggle_audio();
    assert!(o.audio().playing);
    assert!(!o.is_armed(TimerKind::AudioStart));

    o.advance(ms(100));
    o.toggle_audio();
    assert!(!o.audio().playing);

    o.advance(ms(5000));
    assert!(!o.audio().playing);
    assert_eq!(o.audio().plays, 1);
    assert!(!o.surface().last().music_playing);
}

#[test]
fn resume_failure_leaves_music_idle_but_letter_running() {
    let mut o = Orchestrator::new(
        &SerenadeConfig::default(),
        FakeVoice::supported(),
        FakeAudio {
            fail_resume: true,
            ..Default::default()
        },
        RecordingSurface::default(),
    );
    into_letter(&mut o);
    o.advance(ms(1200));
    assert!(!o.audio().playing);
    assert_eq!(o.state().reveal.shown(), 1);
    assert!(!o.surface().last().music_playing);
}

#[test]
fn leaving_letter_stops_music_and_its_timers() {
    let mut o = orchestrator(FakeVoice::supported());
    into_letter(&mut o);
    let total = o.state().reveal.total() as u64;
    o.advance(ms(1200 * total));
    assert!(o.audio().playing);

    o.continue_reading();
    assert_eq!(o.stage(), Stage::Proposal);
    assert!(!o.audio().playing);
    assert_eq!(o.audio().stops, 1);
    assert!(!o.is_armed(TimerKind::RevealTick));
    assert!(!o.is_armed(TimerKind::AudioStart));

    o.advance(ms(60_000));
    assert!(!o.audio().playing);
    assert_eq!(o.audio().plays, 1);
}

#[test]
fn continuing_before_music_starts_cancels_audio_start() {
    let letter = serenade_core::Letter {
        paragraphs: Vec::new(),
        ..Default::default()
    };
    let mut o = orchestrator(FakeVoice::supported()).with_letter(letter);
    o.submit_text("radha");
    o.advance(ms(1500));
    assert!(o.state().can_continue());

    o.continue_reading();
    o.advance(ms(5000));
    assert_eq!(o.audio().plays, 0);
}

// ===========================================================================
// Proposal
// ===========================================================================

#[test]
fn proposal_phases_follow_their_delays() {
    let mut o = orchestrator(FakeVoice::supported());
    into_proposal(&mut o);
    assert_eq!(o.state().proposal.phase, ProposalPhase::Intro);

    o.reveal_declaration();
    assert_eq!(o.state().proposal.phase, ProposalPhase::Intro);

    o.advance(ms(1000));
    assert_eq!(o.state().proposal.phase, ProposalPhase::Hint);

    o.reveal_declaration();
    assert_eq!(o.state().proposal.phase, ProposalPhase::Declaration);
    o.accept();
    assert_eq!(o.state().proposal.outcome, ProposalOutcome::Pending);

    o.advance(ms(1999));
    assert_eq!(o.state().proposal.phase, ProposalPhase::Declaration);
    o.advance(ms(1));
    assert_eq!(o.state().proposal.phase, ProposalPhase::Decision);
}

#[test]
fn evasive_control_only_moves() {
    let mut o = orchestrator(FakeVoice::supported());
    into_decision(&mut o);

    let mut previous = o.state().proposal.evasive;
    for _ in 0..50 {
        let to = o.evade().expect("evasive control live");
        assert_ne!(to, previous);
        assert!((10.0..=90.0).contains(&to.x));
        assert!((10.0..=90.0).contains(&to.y));
        assert_eq!(o.surface().last().evasive, to);
        assert_eq!(o.state().proposal.outcome, ProposalOutcome::Pending);
        previous = to;
    }
    assert_eq!(o.state().proposal.evasions, 50);
}

#[test]
fn evasive_control_is_inert_outside_decision() {
    let mut o = orchestrator(FakeVoice::supported());
    assert!(o.evade().is_none());
    into_proposal(&mut o);
    assert!(o.evade().is_none());
}

#[test]
fn accept_commits_and_runs_a_bounded_burst() {
    let mut o = orchestrator(FakeVoice::supported());
    into_decision(&mut o);
    o.accept();

    assert_eq!(o.state().proposal.outcome, ProposalOutcome::Accepted);
    assert_eq!(o.state().proposal.phase, ProposalPhase::Celebration);
    assert_eq!(o.live_particles(), 100);

    o.advance(ms(0));
    assert_eq!(o.surface().spawned.len(), 1);
    o.advance(ms(990));
    assert_eq!(o.surface().spawned.len(), 100);
    assert!(o.surface().removed.is_empty());

    o.advance(ms(2000));
    assert_eq!(o.surface().removed.len(), 100);
    assert_eq!(o.live_particles(), 0);
    assert_eq!(o.pending_timers(), 0);

    // terminal
    o.evade();
    assert_eq!(o.state().proposal.outcome, ProposalOutcome::Accepted);
}

#[test]
fn failed_units_do_not_block_acceptance() {
    let mut o = Orchestrator::new(
        &SerenadeConfig::default(),
        FakeVoice::supported(),
        FakeAudio::default(),
        RecordingSurface {
            refuse_every: Some(3),
            ..Default::default()
        },
    )
    .with_rng(StdRng::seed_from_u64(3));
    into_decision(&mut o);
    o.accept();
    o.advance(ms(3000));

    assert_eq!(o.state().proposal.outcome, ProposalOutcome::Accepted);
    assert_eq!(o.surface().spawned.len(), 66);
    assert_eq!(o.surface().removed.len(), 66);
    assert_eq!(o.live_particles(), 0);
}

// ===========================================================================
// Teardown
// ===========================================================================

#[test]
fn teardown_mid_letter_silences_everything() {
    let mut o = orchestrator(FakeVoice::supported());
    into_letter(&mut o);
    o.advance(ms(1300));
    let shown = o.state().reveal.shown();
    let frames = o.surface().frames.len();
    assert!(o.pending_timers() > 0);

    o.teardown();
    assert!(o.is_torn_down());
    assert_eq!(o.pending_timers(), 0);
    assert_eq!(o.audio().releases, 1);
    assert!(!o.audio().playing);

    o.advance(ms(120_000));
    o.tap();
    assert_eq!(o.state().reveal.shown(), shown);
    assert_eq!(o.surface().frames.len(), frames);

    o.teardown();
    assert_eq!(o.audio().releases, 1);
}

#[test]
fn teardown_on_lock_stops_capture() {
    let mut o = orchestrator(FakeVoice::supported());
    o.tap();
    o.submit_text("wrong");
    o.teardown();
    assert!(!o.voice().is_listening());
    o.advance(ms(10_000));
    assert_eq!(o.state().lock, LockView::Misheard("wrong".into()));
}
