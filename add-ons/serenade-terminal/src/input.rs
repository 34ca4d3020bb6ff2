//! Keyboard lines to orchestrator actions, depending on what is on screen.

use serenade_core::{ProposalPhase, SessionState, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tap,
    Typed(String),
    ToggleAudio,
    Continue,
    RevealDeclaration,
    Accept,
    Evade,
    Quit,
    Ignored,
}

pub fn parse(line: &str, state: &SessionState) -> Command {
    let input = line.trim();
    if matches!(input, "q" | "quit" | "exit") {
        return Command::Quit;
    }

    match state.stage {
        Stage::Lock if input.is_empty() => Command::Tap,
        Stage::Lock => Command::Typed(input.to_string()),
        Stage::Letter => match input {
            "m" | "music" => Command::ToggleAudio,
            "c" | "continue" | "" => Command::Continue,
            _ => Command::Ignored,
        },
        Stage::Proposal => match (state.proposal.phase, input.to_lowercase().as_str()) {
            (ProposalPhase::Hint, "") => Command::RevealDeclaration,
            (ProposalPhase::Decision, "y" | "yes") => Command::Accept,
            (ProposalPhase::Decision, "n" | "no") => Command::Evade,
            _ => Command::Ignored,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(stage: Stage) -> SessionState {
        let mut s = SessionState::new(3, true);
        s.stage = stage;
        s
    }

    #[test]
    fn lock_takes_taps_and_typed_text() {
        let s = at(Stage::Lock);
        assert_eq!(parse("", &s), Command::Tap);
        assert_eq!(parse("  Radha \n", &s), Command::Typed("Radha".into()));
        assert_eq!(parse("quit", &s), Command::Quit);
    }

    #[test]
    fn letter_keys() {
        let s = at(Stage::Letter);
        assert_eq!(parse("m", &s), Command::ToggleAudio);
        assert_eq!(parse("", &s), Command::Continue);
        assert_eq!(parse("radha", &s), Command::Ignored);
    }

    #[test]
    fn proposal_keys_depend_on_phase() {
        let mut s = at(Stage::Proposal);
        s.proposal.phase = ProposalPhase::Hint;
        assert_eq!(parse("", &s), Command::RevealDeclaration);
        assert_eq!(parse("y", &s), Command::Ignored);

        s.proposal.phase = ProposalPhase::Decision;
        assert_eq!(parse("YES", &s), Command::Accept);
        assert_eq!(parse("no", &s), Command::Evade);
        assert_eq!(parse("", &s), Command::Ignored);
    }
}
