//! Serenade terminal host
//!
//! Drives the orchestrator against wall-clock time: keyboard lines become
//! actions, the microphone (when present) unlocks by voice, frames print to
//! stdout and the melody plays on the default output device.
//!
//! Flags: `--demo` replaces the microphone with a scripted recognizer that
//! mishears once and then hears the phrase.

mod input;
mod surface;

use anyhow::Context;
use input::Command;
use serenade_core::{AmbientAudio, Orchestrator, RenderSurface, SerenadeConfig, Stage, VoiceInput};
use serenade_voice::{default_audio, default_voice_input, ScriptedOutcome, ScriptedSpeech, VoiceInputAdapter};
use std::time::{Duration, Instant};
use surface::TerminalSurface;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound between polls of voice events and timers.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[serenade] .env not loaded: {} (using system environment)", e);
    }

    // Frames go to stdout; keep logs on stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SerenadeConfig::load().context("loading serenade config")?;
    let demo = std::env::args().any(|a| a == "--demo");

    let voice = if demo {
        VoiceInputAdapter::new(Box::new(ScriptedSpeech::new([
            ScriptedOutcome::Heard("hello there".to_string()),
            ScriptedOutcome::Heard("Radhe Radhe".to_string()),
        ])))
    } else {
        default_voice_input(&config)
    };

    let orchestrator = Orchestrator::new(
        &config,
        voice,
        default_audio(&config),
        TerminalSurface::new(std::io::stdout()),
    );

    tracing::info!(demo, "🌹 Serenade started");
    run(orchestrator).await;
    Ok(())
}

async fn run<V, A, R>(mut orchestrator: Orchestrator<V, A, R>)
where
    V: VoiceInput,
    A: AmbientAudio,
    R: RenderSurface,
{
    let epoch = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let wait = orchestrator
            .next_deadline()
            .map(|d| d.saturating_sub(orchestrator.now()).min(POLL_INTERVAL))
            .unwrap_or(POLL_INTERVAL);

        tokio::select! {
            line = lines.next_line() => {
                orchestrator.advance_to(epoch.elapsed());
                match line {
                    Ok(Some(line)) => {
                        let command = input::parse(&line, orchestrator.state());
                        if !apply(&mut orchestrator, command) {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("stdin closed; shutting down");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down");
                break;
            }
        }

        orchestrator.advance_to(epoch.elapsed());
    }

    orchestrator.teardown();
    if orchestrator.stage() == Stage::Proposal {
        println!();
    }
}

/// Apply one command. Returns false when the user asked to quit.
fn apply<V, A, R>(orchestrator: &mut Orchestrator<V, A, R>, command: Command) -> bool
where
    V: VoiceInput,
    A: AmbientAudio,
    R: RenderSurface,
{
    match command {
        Command::Tap => orchestrator.tap(),
        Command::Typed(text) => orchestrator.submit_text(text),
        Command::ToggleAudio => orchestrator.toggle_audio(),
        Command::Continue => orchestrator.continue_reading(),
        Command::RevealDeclaration => orchestrator.reveal_declaration(),
        Command::Accept => orchestrator.accept(),
        Command::Evade => {
            orchestrator.evade();
        }
        Command::Quit => return false,
        Command::Ignored => {}
    }
    true
}
