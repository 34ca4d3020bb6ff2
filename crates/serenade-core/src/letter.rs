//! The letter text and its reveal counter.

/// Paragraphs revealed one per tick in the letter stage.
pub const PARAGRAPHS: &[&str] = &[
    "From the very first day, you turned ordinary hours into something I wanted to remember.",
    "You laugh at my worst jokes, you listen when I ramble, and you make quiet evenings feel like celebrations.",
    "Every song I hear seems to have been written about the way you look at the world.",
    "On the hard days you were the calm, and on the good days you were the reason they were good.",
    "I do not want a future that does not have you in the middle of it.",
    "So I wrote this down, because some things deserve more than a passing sentence.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    pub salutation: String,
    pub paragraphs: Vec<String>,
    pub closing: String,
}

impl Default for Letter {
    fn default() -> Self {
        Self {
            salutation: "My dearest,".to_string(),
            paragraphs: PARAGRAPHS.iter().map(|p| p.to_string()).collect(),
            closing: "Forever yours.".to_string(),
        }
    }
}

impl Letter {
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// The first `progress.shown()` paragraphs.
    pub fn visible(&self, progress: &RevealProgress) -> &[String] {
        let shown = progress.shown().min(self.paragraphs.len());
        &self.paragraphs[..shown]
    }
}

/// Count of letter paragraphs currently shown. Only ever grows, capped at the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealProgress {
    shown: usize,
    total: usize,
}

impl RevealProgress {
    pub fn new(total: usize) -> Self {
        Self { shown: 0, total }
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.shown >= self.total
    }

    /// Reveal one more paragraph. Returns false once complete.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.shown += 1;
        true
    }
}
