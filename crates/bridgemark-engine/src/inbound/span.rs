use crate::directory::{Directory, MessageHistory};
use crate::escape::Escaper;
use crate::mention::MentionResolver;
use crate::model::FormatterContext;
use crate::options::FormatterOptions;

/// An inline node lifted out of the HTML tree, with its children already
/// converted to Discord markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyledSpan {
    Bold(String),
    Italic(String),
    Underline(String),
    Strikethrough(String),
    /// Converted content of a `code` element outside `pre`.
    Monospace(String),
    Spoiler {
        reason: Option<String>,
        content: String,
    },
    /// Raw text, not yet escaped.
    PlainText(String),
    Mention {
        display: String,
        reference: String,
        event_id: Option<String>,
    },
    HorizontalRule,
    LineBreak,
}

pub struct SpanConverter<'f, D> {
    escaper: &'f Escaper,
    resolver: MentionResolver<'f, D>,
    options: &'f FormatterOptions,
}

impl<'f, D: Directory + MessageHistory> SpanConverter<'f, D> {
    pub fn new(escaper: &'f Escaper, directory: &'f D, options: &'f FormatterOptions) -> Self {
        Self {
            escaper,
            resolver: MentionResolver::new(directory, options),
            options,
        }
    }

    pub fn escaper(&self) -> &Escaper {
        self.escaper
    }

    pub fn options(&self) -> &FormatterOptions {
        self.options
    }

    pub fn convert(&self, span: StyledSpan, ctx: &FormatterContext<'_>) -> String {
        match span {
            StyledSpan::Bold(s) => wrap("**", &s),
            StyledSpan::Italic(s) => wrap("*", &s),
            StyledSpan::Underline(s) => wrap("__", &s),
            StyledSpan::Strikethrough(s) => wrap("~~", &s),
            StyledSpan::Monospace(s) => self.monospace(&s),
            StyledSpan::Spoiler { reason, content } => spoiler(reason.as_deref(), &content),
            StyledSpan::PlainText(s) => self.escaper.escape(&s),
            StyledSpan::Mention {
                display,
                reference,
                event_id,
            } => self
                .resolver
                .resolve_pill(&display, &reference, event_id.as_deref(), ctx)
                .into_text(),
            StyledSpan::HorizontalRule => self.options.horizontal_rule.clone(),
            StyledSpan::LineBreak => self.options.newline.clone(),
        }
    }

    fn monospace(&self, s: &str) -> String {
        let s = self.escaper.unescape(s);
        if s.is_empty() {
            return s;
        }
        let pre = if s.starts_with('`') { " " } else { "" };
        let suf = if s.ends_with('`') { " " } else { "" };
        format!("``{pre}{s}{suf}``")
    }
}

fn wrap(delim: &str, s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    format!("{delim}{s}{delim}")
}

fn spoiler(reason: Option<&str>, content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    match reason.filter(|r| !r.is_empty()) {
        Some(reason) => format!("({reason}) ||{content}||"),
        None => format!("||{content}||"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::model::{Portal, PortalKey, User};
    use rstest::rstest;

    fn convert(span: StyledSpan) -> String {
        let dir = InMemoryDirectory::new().with_portal(Portal {
            key: PortalKey::new("100"),
            room_id: "!room:hs".into(),
            guild_id: Some("9".into()),
            name: Some("general".into()),
        });
        let options = FormatterOptions::default();
        let escaper = Escaper::new();
        let user = User::new("@alice:hs");
        SpanConverter::new(&escaper, &dir, &options).convert(span, &FormatterContext::new(&user))
    }

    #[rstest]
    #[case(StyledSpan::Bold("x".into()), "**x**")]
    #[case(StyledSpan::Italic("x".into()), "*x*")]
    #[case(StyledSpan::Underline("x".into()), "__x__")]
    #[case(StyledSpan::Strikethrough("x".into()), "~~x~~")]
    #[case(StyledSpan::Bold(String::new()), "")]
    #[case(StyledSpan::PlainText("a_b*c".into()), r"a\_b\*c")]
    #[case(StyledSpan::HorizontalRule, "\n---\n")]
    #[case(StyledSpan::LineBreak, "\n")]
    fn converts_simple_spans(#[case] span: StyledSpan, #[case] expected: &str) {
        assert_eq!(convert(span), expected);
    }

    #[rstest]
    #[case(r"a\_b", "``a_b``")]
    #[case(r"\`x\`", "`` `x` ``")]
    #[case(r"\`x", "`` `x``")]
    #[case(r"x\`", "``x` ``")]
    #[case("", "")]
    fn monospace_unescapes_and_pads_backticks(#[case] content: &str, #[case] expected: &str) {
        assert_eq!(convert(StyledSpan::Monospace(content.into())), expected);
    }

    #[rstest]
    #[case(Some("nsfw"), "surprise", "(nsfw) ||surprise||")]
    #[case(Some(""), "surprise", "||surprise||")]
    #[case(None, "surprise", "||surprise||")]
    #[case(Some("nsfw"), "", "")]
    fn spoilers(#[case] reason: Option<&str>, #[case] content: &str, #[case] expected: &str) {
        let span = StyledSpan::Spoiler {
            reason: reason.map(str::to_string),
            content: content.into(),
        };
        assert_eq!(convert(span), expected);
    }

    #[test]
    fn mentions_resolve_or_keep_display() {
        let resolved = StyledSpan::Mention {
            display: "general".into(),
            reference: "!room:hs".into(),
            event_id: None,
        };
        assert_eq!(convert(resolved), "<#100>");

        let unknown = StyledSpan::Mention {
            display: "elsewhere".into(),
            reference: "!other:hs".into(),
            event_id: None,
        };
        assert_eq!(convert(unknown), "elsewhere");
    }
}
