//! Example: one capture session
//!
//! Listens on the default microphone until the first utterance (or the
//! listen timeout) and prints what was heard. Set `STT_API_KEY` to transcribe
//! through an OpenAI-compatible API; otherwise the placeholder backend answers.

use serenade_core::{matches, SerenadeConfig, VoiceEvent, VoiceInput};
use serenade_voice::default_voice_input;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SerenadeConfig::load()?;
    let mut voice = default_voice_input(&config);
    if !voice.is_supported() {
        warn!("No speech capability on this host");
        return Ok(());
    }

    info!("🎤 Say the phrase...");
    voice.start_listening()?;

    loop {
        match voice.poll_event() {
            Some(VoiceEvent::Started) => info!("Listening"),
            Some(VoiceEvent::Result(text)) => {
                info!("Heard {:?} (unlocks: {})", text, matches(&text));
                break;
            }
            Some(VoiceEvent::Error(reason)) => {
                warn!("Recognition failed: {}", reason);
                break;
            }
            None => std::thread::sleep(Duration::from_millis(50)),
        }
    }
    Ok(())
}
