//! Example: play the unlock chime and two passes of the ambient loop.

use serenade_core::{AmbientAudio, SerenadeConfig};
use serenade_voice::default_audio;
use serenade_voice::synth::pass_length;
use std::time::{Duration, Instant};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config = SerenadeConfig::load()?;
    let mut audio = default_audio(&config);

    audio.chime()?;
    std::thread::sleep(Duration::from_millis(800));

    audio.play()?;
    info!("🎵 Playing ({:.1}s per pass)", pass_length());

    let until = Instant::now() + Duration::from_secs_f64(pass_length() * 2.0);
    while Instant::now() < until {
        audio.service();
        std::thread::sleep(Duration::from_millis(100));
    }

    audio.stop();
    // Let the last notes and their echo ring out.
    std::thread::sleep(Duration::from_secs(3));
    audio.release();
    Ok(())
}
