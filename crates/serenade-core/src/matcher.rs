//! Unlock phrase matching.
//!
//! Case-insensitive substring match over a small fixed set of literals that
//! spell the same spoken phrase in Latin and Devanagari script.

use crate::error::{SerenadeError, SerenadeResult};

/// Accepted unlock literals, already lower-case.
pub const ACCEPTED_PHRASES: &[&str] = &["radha", "radhe", "राधा", "राधे"];

/// Holds the accepted phrase set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
}

impl Default for PhraseMatcher {
    fn default() -> Self {
        Self {
            phrases: ACCEPTED_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PhraseMatcher {
    /// Matcher over a custom set. Blank entries are dropped; entries are lower-cased.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True if `text` contains any accepted phrase. Blank input never matches.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    /// Evaluate one attempt (transcript or typed text).
    pub fn attempt(&self, text: impl Into<String>) -> UnlockAttempt {
        let text = text.into();
        let matched = self.matches(&text);
        UnlockAttempt { text, matched }
    }
}

/// `matches` against the default phrase set.
pub fn matches(text: &str) -> bool {
    PhraseMatcher::default().matches(text)
}

/// One transient unlock attempt. Never stored past the attempt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockAttempt {
    pub text: String,
    pub matched: bool,
}

impl UnlockAttempt {
    /// `Ok` with the text when matched, `NoMatch` otherwise.
    pub fn verdict(&self) -> SerenadeResult<&str> {
        if self.matched {
            Ok(&self.text)
        } else {
            Err(SerenadeError::NoMatch(self.text.clone()))
        }
    }
}
