use super::{
    cursor::Cursor,
    kinds::{MentionTag, Spoiler},
    span::Span,
    types::{DiscordMention, InlineToken},
};

/// Splits a text run into plain text, spoiler delimiters and mention tags.
///
/// The returned tokens cover the whole input in order. Malformed tags (no
/// closing `>`, empty id, unexpected byte) are left inside `Text`.
pub fn parse_inline(s: &str) -> Vec<InlineToken> {
    let mut cur = Cursor::new(s);
    let mut out = vec![];
    let mut text_start = cur.pos();

    fn flush_text(out: &mut Vec<InlineToken>, start: usize, end: usize) {
        if end > start {
            out.push(InlineToken::Text(Span { start, end }));
        }
    }

    while !cur.eof() {
        let token = try_parse_spoiler_delim(&mut cur).or_else(|| try_parse_mention(&mut cur));
        if let Some(token) = token {
            let span = token.span();
            flush_text(&mut out, text_start, span.start);
            text_start = span.end;
            out.push(token);
            continue;
        }
        cur.bump();
    }

    flush_text(&mut out, text_start, cur.pos());
    out
}

fn try_parse_spoiler_delim(cur: &mut Cursor<'_>) -> Option<InlineToken> {
    if !cur.starts_with(Spoiler::DELIM) {
        return None;
    }
    let start = cur.pos();
    cur.bump_n(Spoiler::DELIM.len());
    Some(InlineToken::SpoilerDelim(Span {
        start,
        end: cur.pos(),
    }))
}

/// Attempts to parse a mention tag at the current position.
///
/// On failure the cursor is restored.
fn try_parse_mention(cur: &mut Cursor<'_>) -> Option<InlineToken> {
    if cur.peek() != Some(MentionTag::OPEN) {
        return None;
    }

    let saved = cur.clone();
    let start = cur.pos();
    cur.bump(); // <

    let mention = match cur.peek() {
        Some(MentionTag::USER) => {
            cur.bump();
            if cur.eat(MentionTag::ROLE) {
                snowflake(cur).map(DiscordMention::Role)
            } else {
                cur.eat(MentionTag::NICKNAME);
                snowflake(cur).map(DiscordMention::User)
            }
        }
        Some(MentionTag::CHANNEL) => {
            cur.bump();
            snowflake(cur).map(DiscordMention::Channel)
        }
        Some(MentionTag::EMOJI) => emoji(cur, false),
        Some(MentionTag::ANIMATED) => {
            cur.bump();
            if cur.peek() == Some(MentionTag::EMOJI) {
                emoji(cur, true)
            } else {
                None
            }
        }
        _ => None,
    };

    match mention {
        Some(mention) if cur.eat(MentionTag::CLOSE) => Some(InlineToken::Mention {
            full: Span {
                start,
                end: cur.pos(),
            },
            mention,
        }),
        _ => {
            *cur = saved;
            None
        }
    }
}

fn snowflake(cur: &mut Cursor<'_>) -> Option<String> {
    let digits = cur.eat_while(MentionTag::is_snowflake_byte);
    (!digits.is_empty()).then(|| digits.slice(cur.s).to_string())
}

/// Parses `:name:id` with the cursor on the first colon.
fn emoji(cur: &mut Cursor<'_>, animated: bool) -> Option<DiscordMention> {
    if !cur.eat(MentionTag::EMOJI) {
        return None;
    }
    let name = cur.eat_while(MentionTag::is_emoji_name_byte);
    if name.is_empty() || !cur.eat(MentionTag::EMOJI) {
        return None;
    }
    let id = snowflake(cur)?;
    Some(DiscordMention::Emoji {
        name: name.slice(cur.s).to_string(),
        id,
        animated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mentions(s: &str) -> Vec<DiscordMention> {
        parse_inline(s)
            .into_iter()
            .filter_map(|t| match t {
                InlineToken::Mention { mention, .. } => Some(mention),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn plain_text_is_one_token() {
        let tokens = parse_inline("hello world");
        assert_eq!(
            tokens,
            vec![InlineToken::Text(Span { start: 0, end: 11 })]
        );
    }

    #[test]
    fn spoiler_delimiters_split_text() {
        let tokens = parse_inline("a||b||");
        assert_eq!(
            tokens,
            vec![
                InlineToken::Text(Span { start: 0, end: 1 }),
                InlineToken::SpoilerDelim(Span { start: 1, end: 3 }),
                InlineToken::Text(Span { start: 3, end: 4 }),
                InlineToken::SpoilerDelim(Span { start: 4, end: 6 }),
            ]
        );
    }

    #[test]
    fn triple_pipe_is_delimiter_then_text() {
        let tokens = parse_inline("|||");
        assert_eq!(
            tokens,
            vec![
                InlineToken::SpoilerDelim(Span { start: 0, end: 2 }),
                InlineToken::Text(Span { start: 2, end: 3 }),
            ]
        );
    }

    #[rstest]
    #[case("<@123>", DiscordMention::User("123".into()))]
    #[case("<@!123>", DiscordMention::User("123".into()))]
    #[case("<@&77>", DiscordMention::Role("77".into()))]
    #[case("<#900>", DiscordMention::Channel("900".into()))]
    #[case(
        "<:blob:42>",
        DiscordMention::Emoji { name: "blob".into(), id: "42".into(), animated: false }
    )]
    #[case(
        "<a:party_blob:43>",
        DiscordMention::Emoji { name: "party_blob".into(), id: "43".into(), animated: true }
    )]
    fn recognises_mention_tags(#[case] input: &str, #[case] expected: DiscordMention) {
        let tokens = parse_inline(input);
        assert_eq!(
            tokens,
            vec![InlineToken::Mention {
                full: Span {
                    start: 0,
                    end: input.len()
                },
                mention: expected,
            }]
        );
    }

    #[rstest]
    #[case("<@>")]
    #[case("<@abc>")]
    #[case("<@123")]
    #[case("<#>")]
    #[case("<:nameonly>")]
    #[case("<::42>")]
    #[case("<a:x>")]
    #[case("<b:x:1>")]
    #[case("<@!&1>")]
    fn malformed_tags_stay_text(#[case] input: &str) {
        assert_eq!(
            parse_inline(input),
            vec![InlineToken::Text(Span {
                start: 0,
                end: input.len()
            })]
        );
    }

    #[test]
    fn mention_inside_text_keeps_surroundings() {
        let s = "hi <@1>, see <#2>";
        let tokens = parse_inline(s);
        let texts: Vec<&str> = tokens
            .iter()
            .filter(|t| matches!(t, InlineToken::Text(_)))
            .map(|t| t.span().slice(s))
            .collect();
        assert_eq!(texts, vec!["hi ", ", see "]);
        assert_eq!(
            mentions(s),
            vec![
                DiscordMention::User("1".into()),
                DiscordMention::Channel("2".into())
            ]
        );
    }

    #[test]
    fn retries_after_failed_tag() {
        assert_eq!(mentions("<<@5>"), vec![DiscordMention::User("5".into())]);
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let s = "héllo ||wörld||";
        let rebuilt: String = parse_inline(s).iter().map(|t| t.span().slice(s)).collect();
        assert_eq!(rebuilt, s);
    }
}
