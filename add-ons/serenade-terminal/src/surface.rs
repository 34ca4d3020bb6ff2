//! Line-oriented rendering of frames.
//!
//! Only what changed since the previous frame is printed, so the transcript
//! reads like the screen would have looked over time.

use serenade_core::{
    Frame, LockView, Particle, ProposalOutcome, ProposalPhase, RenderSurface, SerenadeError,
    SerenadeResult, Stage,
};
use std::io::Write;

pub struct TerminalSurface<W: Write> {
    out: W,
    last: Option<Frame>,
    particles_shown: usize,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            particles_shown: 0,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn lock_line(frame: &Frame) -> String {
        match &frame.lock {
            LockView::Prompt if frame.typed_fallback => {
                "🔒 Type the secret word and press Enter.".to_string()
            }
            LockView::Prompt => {
                "🔒 Press Enter and say the secret word (or type it).".to_string()
            }
            LockView::Listening => "🎤 Listening...".to_string(),
            LockView::Misheard(text) => format!("🙈 \"{}\"? Not quite. Try again.", text),
            LockView::Error(reason) => format!("⚠️ Couldn't hear you ({}).", reason),
            LockView::Unlocked => "🔓 Unlocked!".to_string(),
        }
    }

    fn proposal_line(frame: &Frame) -> Option<&'static str> {
        match frame.proposal_phase {
            ProposalPhase::Intro => None,
            ProposalPhase::Hint => Some("💌 There's one more thing. Press Enter."),
            ProposalPhase::Declaration => Some("💍 Will you marry me?"),
            ProposalPhase::Decision => Some("   [y] Yes    [n] No"),
            ProposalPhase::Celebration => Some("🎉 Yes! Forever starts now."),
        }
    }

    fn write_changes(&mut self, frame: &Frame) -> std::io::Result<()> {
        let prev = self.last.as_ref();
        let stage_changed = prev.map(|p| p.stage) != Some(frame.stage);

        match frame.stage {
            Stage::Lock => {
                if stage_changed || prev.map(|p| &p.lock) != Some(&frame.lock) {
                    writeln!(self.out, "{}", Self::lock_line(frame))?;
                }
            }
            Stage::Letter => {
                if stage_changed {
                    writeln!(self.out, "\n{}\n", frame.salutation)?;
                }
                let already = if stage_changed {
                    0
                } else {
                    prev.map(|p| p.paragraphs.len()).unwrap_or(0)
                };
                for paragraph in frame.paragraphs.iter().skip(already) {
                    writeln!(self.out, "  {}\n", paragraph)?;
                }
                let was_ready = !stage_changed && prev.map(|p| p.can_continue).unwrap_or(false);
                if frame.can_continue && !was_ready {
                    writeln!(self.out, "[c] continue   [m] music on/off")?;
                }
                let music_was = prev.map(|p| p.music_playing).unwrap_or(false);
                if frame.music_playing != music_was {
                    let state = if frame.music_playing { "🎵 music on" } else { "🔇 music off" };
                    writeln!(self.out, "{}", state)?;
                }
            }
            Stage::Proposal => {
                let phase_changed = stage_changed || prev.map(|p| p.proposal_phase) != Some(frame.proposal_phase);
                if phase_changed {
                    if let Some(line) = Self::proposal_line(frame) {
                        writeln!(self.out, "{}", line)?;
                    }
                } else if frame.outcome == ProposalOutcome::Pending
                    && prev.map(|p| p.evasive) != Some(frame.evasive)
                {
                    writeln!(
                        self.out,
                        "   [n] slips away to ({:.0}%, {:.0}%)... try [y]?",
                        frame.evasive.x, frame.evasive.y
                    )?;
                }
            }
        }
        self.out.flush()
    }
}

fn render_err(e: std::io::Error) -> SerenadeError {
    SerenadeError::Render(e.to_string())
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn render(&mut self, frame: &Frame) -> SerenadeResult<()> {
        self.write_changes(frame).map_err(render_err)?;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn spawn_particle(&mut self, particle: &Particle) -> SerenadeResult<()> {
        self.particles_shown += 1;
        write!(self.out, "{}", particle.glyph).map_err(render_err)?;
        if self.particles_shown % 25 == 0 {
            writeln!(self.out).map_err(render_err)?;
        }
        self.out.flush().map_err(render_err)
    }

    fn remove_particle(&mut self, _id: u32) -> SerenadeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenade_core::{Letter, SessionState};

    fn text(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn prompt_mentions_typing_when_speech_is_unsupported() {
        let mut s = TerminalSurface::new(Vec::new());
        let frame = Frame::compose(&SessionState::new(2, false), &Letter::default(), false);
        s.render(&frame).unwrap();
        assert!(text(s).contains("Type the secret word"));
    }

    #[test]
    fn only_new_paragraphs_are_printed() {
        let letter = Letter::default();
        let mut state = SessionState::new(letter.paragraph_count(), true);
        state.stage = Stage::Letter;

        let mut s = TerminalSurface::new(Vec::new());
        state.reveal.advance();
        s.render(&Frame::compose(&state, &letter, false)).unwrap();
        state.reveal.advance();
        s.render(&Frame::compose(&state, &letter, false)).unwrap();

        let out = text(s);
        assert_eq!(out.matches(letter.paragraphs[0].as_str()).count(), 1);
        assert_eq!(out.matches(letter.paragraphs[1].as_str()).count(), 1);
        assert_eq!(out.matches(letter.salutation.as_str()).count(), 1);
    }

    #[test]
    fn particles_print_their_glyph() {
        let mut s = TerminalSurface::new(Vec::new());
        let p = Particle {
            id: 0,
            x: 10.0,
            y: 10.0,
            size_px: 20.0,
            glyph: '✨',
            offset: std::time::Duration::ZERO,
            lifetime: std::time::Duration::from_secs(2),
        };
        s.spawn_particle(&p).unwrap();
        assert_eq!(text(s), "✨");
    }
}
