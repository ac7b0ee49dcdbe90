use super::span::Span;

/// A Discord mention tag, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordMention {
    User(String),
    Role(String),
    Channel(String),
    Emoji {
        name: String,
        id: String,
        animated: bool,
    },
}

/// A piece of a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineToken {
    /// Text with no Discord-specific meaning.
    Text(Span),
    /// A `||` delimiter. Whether it opens or closes is decided by the caller.
    SpoilerDelim(Span),
    /// A complete mention tag, `full` covering the angle brackets.
    Mention { full: Span, mention: DiscordMention },
}

impl InlineToken {
    pub fn span(&self) -> Span {
        match self {
            InlineToken::Text(sp) | InlineToken::SpoilerDelim(sp) => *sp,
            InlineToken::Mention { full, .. } => *full,
        }
    }
}
