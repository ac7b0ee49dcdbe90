/// A byte range `[start, end)` into a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// The text this span covers in `s`.
    ///
    /// Spans produced by the parser always fall on char boundaries, since
    /// they start and end next to ASCII delimiters.
    pub fn slice(self, s: &str) -> &str {
        &s[self.start..self.end]
    }
}
