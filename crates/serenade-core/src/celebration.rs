//! Celebration burst planning.
//!
//! A burst is a fixed number of short-lived units, each with its own spawn
//! offset and lifetime. The orchestrator schedules them; the render surface
//! draws them. A unit that fails to render is simply skipped.

use crate::config::CelebrationSettings;
use rand::Rng;
use std::time::Duration;

/// Glyphs a unit may be drawn with.
pub const GLYPHS: &[char] = &['❤', '💖', '💕', '💗', '🌸', '✨'];

/// One cosmetic feedback unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: u32,
    /// Horizontal position, percent of the viewport.
    pub x: f32,
    /// Vertical position, percent of the viewport.
    pub y: f32,
    pub size_px: f32,
    pub glyph: char,
    /// Delay from the burst trigger until this unit appears.
    pub offset: Duration,
    /// Time on screen before it removes itself.
    pub lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct CelebrationTrigger {
    settings: CelebrationSettings,
}

impl CelebrationTrigger {
    pub fn new(settings: CelebrationSettings) -> Self {
        Self { settings }
    }

    /// Plan one burst: unit `i` appears `i * stagger` after the trigger.
    pub fn burst<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Particle> {
        let s = &self.settings;
        let stagger = Duration::from_millis(s.stagger_ms);
        let lifetime = Duration::from_millis(s.lifetime_ms);
        (0..s.burst_count)
            .map(|id| Particle {
                id,
                x: rng.gen_range(0.0..=100.0),
                y: rng.gen_range(0.0..=100.0),
                size_px: rng.gen_range(s.min_size_px..=s.max_size_px),
                glyph: GLYPHS[rng.gen_range(0..GLYPHS.len())],
                offset: stagger * id,
                lifetime,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn burst_is_bounded_and_staggered() {
        let trigger = CelebrationTrigger::new(CelebrationSettings::default());
        let burst = trigger.burst(&mut StdRng::seed_from_u64(1));

        assert_eq!(burst.len(), 100);
        assert_eq!(burst[0].offset, Duration::ZERO);
        assert_eq!(burst[1].offset, Duration::from_millis(10));
        assert_eq!(burst[99].offset, Duration::from_millis(990));
        for p in &burst {
            assert_eq!(p.lifetime, Duration::from_secs(2));
            assert!((16.0..=40.0).contains(&p.size_px));
            assert!((0.0..=100.0).contains(&p.x) && (0.0..=100.0).contains(&p.y));
            assert!(GLYPHS.contains(&p.glyph));
        }
    }

    #[test]
    fn ids_are_unique() {
        let trigger = CelebrationTrigger::new(CelebrationSettings::default());
        let burst = trigger.burst(&mut StdRng::seed_from_u64(2));
        let mut ids: Vec<_> = burst.iter().map(|p| p.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), burst.len());
    }
}
