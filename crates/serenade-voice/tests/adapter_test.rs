//! Session contract of the voice input adapter.
//!
//! Hardware-backed tests are ignored by default; run them with
//! `cargo test -p serenade-voice -- --ignored` on a machine with a microphone.

use serenade_core::{SerenadeConfig, SerenadeError, VoiceEvent, VoiceInput};
use serenade_voice::{
    default_voice_input, CaptureSignal, MicrophoneSpeech, PlaceholderStt, ScriptedOutcome,
    ScriptedSpeech, SpeechCapability, VoiceInputAdapter,
};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn events(adapter: &mut VoiceInputAdapter) -> Vec<VoiceEvent> {
    std::iter::from_fn(|| adapter.poll_event()).collect()
}

fn adapter(script: impl IntoIterator<Item = ScriptedOutcome>) -> VoiceInputAdapter {
    VoiceInputAdapter::new(Box::new(ScriptedSpeech::new(script)))
}

#[test]
fn one_session_yields_started_then_result() {
    let mut a = adapter([ScriptedOutcome::Heard("Radhe Radhe".into())]);
    assert!(a.is_supported());

    a.start_listening().unwrap();
    assert!(a.is_listening());
    assert_eq!(
        events(&mut a),
        vec![VoiceEvent::Started, VoiceEvent::Result("Radhe Radhe".into())]
    );
    assert!(!a.is_listening());
}

#[test]
fn second_start_while_active_is_ignored() {
    let mut a = adapter([
        ScriptedOutcome::Silent,
        ScriptedOutcome::Heard("radha".into()),
    ]);
    a.start_listening().unwrap();
    a.start_listening().unwrap();

    // Still the first (silent) session: no second Started, no transcript.
    assert_eq!(events(&mut a), vec![VoiceEvent::Started]);
    assert!(a.is_listening());
}

#[test]
fn failure_surfaces_as_error_event() {
    let mut a = adapter([ScriptedOutcome::Fails("no speech detected".into())]);
    a.start_listening().unwrap();
    assert_eq!(
        events(&mut a),
        vec![
            VoiceEvent::Started,
            VoiceEvent::Error("no speech detected".into())
        ]
    );
}

#[test]
fn start_failure_is_a_recognition_error_and_leaves_adapter_idle() {
    let mut a = adapter([ScriptedOutcome::RefusesToStart("permission denied".into())]);
    let err = a.start_listening().unwrap_err();
    assert!(matches!(err, SerenadeError::Recognition(m) if m.contains("permission denied")));
    assert!(!a.is_listening());
    assert_eq!(a.poll_event(), None);
}

#[test]
fn stop_discards_pending_events() {
    let mut a = adapter([ScriptedOutcome::Heard("radhe".into())]);
    a.start_listening().unwrap();
    a.stop_listening();
    assert!(!a.is_listening());
    assert_eq!(a.poll_event(), None);
}

/// Capability that reports a late failure after its transcript.
struct Stuttering {
    queued: Vec<CaptureSignal>,
}

impl SpeechCapability for Stuttering {
    fn is_available(&self) -> bool {
        true
    }

    fn begin(&mut self) -> serenade_voice::VoiceResult<()> {
        self.queued = vec![
            CaptureSignal::Failed("late".into()),
            CaptureSignal::Transcript("radhe".into()),
            CaptureSignal::Started,
        ];
        Ok(())
    }

    fn abort(&mut self) {
        self.queued.clear();
    }

    fn poll(&mut self) -> Option<CaptureSignal> {
        self.queued.pop()
    }
}

#[test]
fn at_most_one_terminal_event_per_session() {
    let mut a = VoiceInputAdapter::new(Box::new(Stuttering { queued: Vec::new() }));
    a.start_listening().unwrap();
    assert_eq!(
        events(&mut a),
        vec![VoiceEvent::Started, VoiceEvent::Result("radhe".into())]
    );
}

/// Capability that records how often its platform session was torn down.
struct Counted {
    outcome: Option<CaptureSignal>,
    queued: Vec<CaptureSignal>,
    aborts: Rc<Cell<usize>>,
}

impl SpeechCapability for Counted {
    fn is_available(&self) -> bool {
        true
    }

    fn begin(&mut self) -> serenade_voice::VoiceResult<()> {
        self.queued = self.outcome.iter().cloned().collect();
        self.queued.push(CaptureSignal::Started);
        Ok(())
    }

    fn abort(&mut self) {
        self.queued.clear();
        self.aborts.set(self.aborts.get() + 1);
    }

    fn poll(&mut self) -> Option<CaptureSignal> {
        self.queued.pop()
    }
}

fn counted(outcome: Option<CaptureSignal>) -> (VoiceInputAdapter, Rc<Cell<usize>>) {
    let aborts = Rc::new(Cell::new(0));
    let capability = Counted {
        outcome,
        queued: Vec::new(),
        aborts: Rc::clone(&aborts),
    };
    (VoiceInputAdapter::new(Box::new(capability)), aborts)
}

#[test]
fn finished_session_releases_platform_capture() {
    let (mut a, aborts) = counted(Some(CaptureSignal::Transcript("radha".into())));
    a.start_listening().unwrap();
    assert_eq!(
        events(&mut a),
        vec![VoiceEvent::Started, VoiceEvent::Result("radha".into())]
    );
    assert_eq!(aborts.get(), 1);

    // Nothing left to stop.
    a.stop_listening();
    assert_eq!(aborts.get(), 1);
}

#[test]
fn failed_session_releases_platform_capture() {
    let (mut a, aborts) = counted(Some(CaptureSignal::Failed("no speech detected".into())));
    a.start_listening().unwrap();
    assert_eq!(
        events(&mut a),
        vec![
            VoiceEvent::Started,
            VoiceEvent::Error("no speech detected".into())
        ]
    );
    assert_eq!(aborts.get(), 1);
}

#[test]
fn open_session_is_only_released_by_stop() {
    let (mut a, aborts) = counted(None);
    a.start_listening().unwrap();
    assert_eq!(events(&mut a), vec![VoiceEvent::Started]);
    assert_eq!(aborts.get(), 0);

    a.stop_listening();
    assert_eq!(aborts.get(), 1);
}

#[test]
fn unsupported_adapter_refuses_to_listen() {
    let mut a = VoiceInputAdapter::unsupported();
    assert!(!a.is_supported());
    assert!(matches!(
        a.start_listening(),
        Err(SerenadeError::UnsupportedCapability(_))
    ));
    a.stop_listening();
    assert_eq!(a.poll_event(), None);
}

#[test]
fn disabled_voice_config_means_unsupported() {
    let mut config = SerenadeConfig::default();
    config.voice.enabled = false;
    assert!(!default_voice_input(&config).is_supported());
}

#[test]
#[ignore] // Requires audio hardware and manual speech
fn microphone_session_reaches_a_terminal_event() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    println!("\n🎤 Say \"Radha\" within 8 seconds...\n");
    let mic = MicrophoneSpeech::new(
        serenade_core::VoiceSettings::default(),
        Arc::new(PlaceholderStt::with_response("radha")),
    );
    let mut a = VoiceInputAdapter::new(Box::new(mic));
    assert!(a.is_supported(), "no input device");
    a.start_listening().unwrap();

    let deadline = Instant::now() + Duration::from_secs(12);
    let mut seen = Vec::new();
    while Instant::now() < deadline && a.is_listening() {
        seen.extend(events(&mut a));
        std::thread::sleep(Duration::from_millis(50));
    }
    seen.extend(events(&mut a));

    assert_eq!(seen.first(), Some(&VoiceEvent::Started));
    assert!(matches!(
        seen.last(),
        Some(VoiceEvent::Result(_)) | Some(VoiceEvent::Error(_))
    ));
}
