use std::ops::Range;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::directory::{Directory, MessageHistory};
use crate::escape::Escaper;
use crate::inline::{DiscordMention, InlineToken, Span, kinds::Spoiler, parse_inline};
use crate::mention::{MentionResolver, Resolution};

const SPOILER_OPEN: &str = "<span data-mx-spoiler>";
const SPOILER_CLOSE: &str = "</span>";
const LINE_BREAK: &str = "<br>\n";
/// Stands in for each hidden character of a spoiler in the plain body.
const SPOILER_MASK: char = '\u{2588}';

/// Result of rendering Discord markdown to Matrix HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHtml {
    pub html: String,
    /// Plain-text rendering of the same content, for the message body.
    pub text: String,
}

/// A `||` delimiter waiting for its partner.
#[derive(Debug, Clone, Copy)]
struct OpenSpoiler {
    /// Byte offset in the output where the span tag goes.
    at: usize,
    /// Byte offset in the plain body where the hidden content starts.
    text_at: usize,
    /// Element nesting depth the delimiter appeared at.
    depth: usize,
}

/// Renders one message. Holds the state of a single pulldown-cmark pass.
pub struct HtmlRenderer<'s, 'f, D> {
    source: &'s str,
    escaper: &'f Escaper,
    resolver: &'s MentionResolver<'f, D>,
    out: String,
    /// Closing markup for each open element.
    stack: Vec<String>,
    /// Adjacent text and raw HTML, tokenised together on flush.
    run: String,
    /// Ranges of `run` that came from escapes or entities.
    opaque: Vec<Range<usize>>,
    spoiler: Option<OpenSpoiler>,
    link_depth: usize,
    in_code_block: bool,
    top_level_blocks: usize,
    first_block_is_paragraph: bool,
    body: String,
    /// Newlines owed to `body` before its next content.
    body_break: usize,
    /// Next number of each open list, `None` for bullet lists.
    lists: Vec<Option<u64>>,
}

impl<'s, 'f, D: Directory + MessageHistory> HtmlRenderer<'s, 'f, D> {
    pub fn new(source: &'s str, escaper: &'f Escaper, resolver: &'s MentionResolver<'f, D>) -> Self {
        Self {
            source,
            escaper,
            resolver,
            out: String::with_capacity(source.len() * 2),
            stack: vec![],
            run: String::new(),
            opaque: vec![],
            spoiler: None,
            link_depth: 0,
            in_code_block: false,
            top_level_blocks: 0,
            first_block_is_paragraph: false,
            body: String::with_capacity(source.len()),
            body_break: 0,
            lists: vec![],
        }
    }

    /// Parses `source` and renders it. `source` should already have had its
    /// ambiguous escapes repaired.
    pub fn render(mut self) -> RenderedHtml {
        let parser = Parser::new_ext(self.source, Options::ENABLE_STRIKETHROUGH);
        for (event, range) in parser.into_offset_iter() {
            self.process_event(event, range);
        }
        self.finish()
    }

    fn process_event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Text(text) if self.in_code_block => {
                self.out.push_str(&encode_text(&text));
                self.plain(&text);
            }
            Event::Text(text) => {
                // An entity, or text starting with a backslash-escaped character.
                let opaque = if self.source.get(range.clone()) != Some(&*text) {
                    text.len()
                } else if escaped_at(self.source, range.start) {
                    text.chars().next().map_or(0, char::len_utf8)
                } else {
                    0
                };
                self.push_run(&text, opaque);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_run(&html, 0),
            Event::Start(tag) => {
                self.flush_run();
                self.start_tag(tag, range);
            }
            Event::End(tag) => {
                if tag == TagEnd::HtmlBlock {
                    let len = self.run.trim_end_matches('\n').len();
                    self.run.truncate(len);
                }
                self.flush_run();
                self.end_tag(tag);
            }
            Event::Code(code) => {
                self.flush_run();
                self.out.push_str("<code>");
                self.out.push_str(&encode_text(&code));
                self.out.push_str("</code>");
                self.plain(&code);
            }
            Event::SoftBreak | Event::HardBreak => {
                self.flush_run();
                self.out.push_str(LINE_BREAK);
                self.plain("\n");
            }
            Event::Rule => {
                self.flush_run();
                self.count_block(false);
                self.out.push_str("<hr>\n");
                let gap = self.block_gap();
                self.plain_break(gap);
                self.plain("---");
                self.plain_break(gap);
            }
            _ => {}
        }
    }

    fn count_block(&mut self, paragraph: bool) {
        if self.stack.is_empty() {
            self.top_level_blocks += 1;
            if self.top_level_blocks == 1 {
                self.first_block_is_paragraph = paragraph;
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: Range<usize>) {
        self.count_block(matches!(tag, Tag::Paragraph | Tag::HtmlBlock));
        self.start_plain_block(&tag);

        let (open, close) = match tag {
            Tag::Paragraph | Tag::HtmlBlock => ("<p>".to_string(), "</p>\n".to_string()),
            Tag::Heading { level, .. } => (format!("<{level}>"), format!("</{level}>\n")),
            Tag::BlockQuote(_) => ("<blockquote>\n".to_string(), "</blockquote>\n".to_string()),
            Tag::CodeBlock(kind) => {
                self.in_code_block = true;
                let language = match &kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
                    CodeBlockKind::Indented => None,
                };
                let open = match language {
                    Some(lang) => format!(
                        "<pre><code class=\"language-{}\">",
                        encode_double_quoted_attribute(lang)
                    ),
                    None => "<pre><code>".to_string(),
                };
                (open, "</code></pre>\n".to_string())
            }
            Tag::List(Some(1)) => ("<ol>\n".to_string(), "</ol>\n".to_string()),
            Tag::List(Some(start)) => (format!("<ol start=\"{start}\">\n"), "</ol>\n".to_string()),
            Tag::List(None) => ("<ul>\n".to_string(), "</ul>\n".to_string()),
            Tag::Item => ("<li>".to_string(), "</li>\n".to_string()),
            Tag::Emphasis => ("<em>".to_string(), "</em>".to_string()),
            Tag::Strong if self.source.as_bytes().get(range.start) == Some(&b'_') => {
                ("<u>".to_string(), "</u>".to_string())
            }
            Tag::Strong => ("<strong>".to_string(), "</strong>".to_string()),
            Tag::Strikethrough => ("<del>".to_string(), "</del>".to_string()),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.link_depth += 1;
                (
                    format!("<a href=\"{}\">", encode_double_quoted_attribute(&dest_url)),
                    "</a>".to_string(),
                )
            }
            _ => (String::new(), String::new()),
        };

        self.out.push_str(&open);
        self.stack.push(close);
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => self.in_code_block = false,
            TagEnd::Link | TagEnd::Image => self.link_depth = self.link_depth.saturating_sub(1),
            TagEnd::List(_) => {
                self.lists.pop();
            }
            _ => {}
        }
        self.end_plain_block(tag);

        let close = self.stack.pop().unwrap_or_default();
        if self.spoiler.is_some_and(|open| self.stack.len() < open.depth) {
            self.abandon_spoiler();
        }
        self.out.push_str(&close);
    }

    /// Buffers `text`, marking its first `opaque` bytes as literal.
    fn push_run(&mut self, text: &str, opaque: usize) {
        let start = self.run.len();
        self.run.push_str(text);
        if opaque > 0 {
            self.opaque.push(start..start + opaque);
        }
    }

    /// Tokenises the buffered run into text, spoiler delimiters and mentions.
    fn flush_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        let run = std::mem::take(&mut self.run);
        let opaque = std::mem::take(&mut self.opaque);

        for token in parse_inline(&run) {
            let span = token.span();
            let escaped = overlaps(&opaque, span);
            match token {
                InlineToken::Text(_) => self.text(span.slice(&run)),
                _ if escaped => self.text(span.slice(&run)),
                InlineToken::SpoilerDelim(_) => self.spoiler_delim(),
                InlineToken::Mention { mention, .. } => self.mention(span.slice(&run), &mention),
            }
        }
    }

    /// Escapes literal text, turning bare links into anchors outside of links.
    fn text(&mut self, s: &str) {
        self.plain(s);
        if self.link_depth > 0 {
            push_escaped(&mut self.out, s);
            return;
        }
        let mut last = 0;
        for link in self.escaper.links(s) {
            push_escaped(&mut self.out, &s[last..link.start]);
            let url = &s[link.clone()];
            self.out.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                encode_double_quoted_attribute(url),
                encode_text(url)
            ));
            last = link.end;
        }
        push_escaped(&mut self.out, &s[last..]);
    }

    fn spoiler_delim(&mut self) {
        let depth = self.stack.len();
        match self.spoiler {
            None => {
                self.flush_plain_break();
                self.spoiler = Some(OpenSpoiler {
                    at: self.out.len(),
                    text_at: self.body.len(),
                    depth,
                })
            }
            Some(open) if open.depth == depth && open.at == self.out.len() => {
                // `||||` is not an empty spoiler.
                self.out.push_str("||||");
                self.plain("||||");
                self.spoiler = None;
            }
            Some(open) if open.depth == depth => {
                self.out.insert_str(open.at, SPOILER_OPEN);
                self.out.push_str(SPOILER_CLOSE);
                let hidden = self.body.split_off(open.text_at);
                self.body
                    .extend(hidden.chars().map(|c| if c == '\n' { c } else { SPOILER_MASK }));
                self.spoiler = None;
            }
            Some(_) => self.text(Spoiler::TEXT),
        }
    }

    fn abandon_spoiler(&mut self) {
        if let Some(open) = self.spoiler.take() {
            self.out.insert_str(open.at, Spoiler::TEXT);
            self.body.insert_str(open.text_at, Spoiler::TEXT);
        }
    }

    fn mention(&mut self, literal: &str, mention: &DiscordMention) {
        match self.resolver.resolve_discord_mention(mention, literal) {
            Resolution::Resolved(pill) if self.link_depth == 0 => {
                self.out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    encode_double_quoted_attribute(&pill.href),
                    encode_text(&pill.label)
                ));
                self.plain(&pill.label);
            }
            Resolution::Resolved(pill) => {
                push_escaped(&mut self.out, &pill.label);
                self.plain(&pill.label);
            }
            Resolution::Fallback(text) => {
                push_escaped(&mut self.out, &text);
                self.plain(&text);
            }
        }
    }

    /// Blank line between blocks, single newline between blocks inside a list.
    fn block_gap(&self) -> usize {
        if self.lists.is_empty() { 2 } else { 1 }
    }

    fn start_plain_block(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::HtmlBlock if !self.lists.is_empty() => {}
            Tag::Paragraph
            | Tag::HtmlBlock
            | Tag::Heading { .. }
            | Tag::BlockQuote(_)
            | Tag::CodeBlock(_) => self.plain_break(self.block_gap()),
            Tag::List(start) => {
                self.plain_break(self.block_gap());
                self.lists.push(*start);
            }
            Tag::Item => {
                self.plain_break(1);
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n = n.saturating_add(1);
                        marker
                    }
                    _ => format!("{indent}- "),
                };
                self.plain(&marker);
            }
            _ => {}
        }
    }

    fn end_plain_block(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Item => self.plain_break(1),
            TagEnd::Paragraph
            | TagEnd::HtmlBlock
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::List(_) => self.plain_break(self.block_gap()),
            _ => {}
        }
    }

    fn plain(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.flush_plain_break();
        self.body.push_str(s);
    }

    fn plain_break(&mut self, newlines: usize) {
        self.body_break = self.body_break.max(newlines);
    }

    fn flush_plain_break(&mut self) {
        let newlines = std::mem::take(&mut self.body_break);
        if newlines == 0 || self.body.is_empty() {
            return;
        }
        let len = self.body.trim_end_matches('\n').len();
        self.body.truncate(len);
        self.body.extend(std::iter::repeat_n('\n', newlines));
    }

    fn finish(mut self) -> RenderedHtml {
        self.flush_run();
        self.abandon_spoiler();
        while let Some(close) = self.stack.pop() {
            self.out.push_str(&close);
        }

        let html = self.out.trim_end_matches('\n');
        let html = if self.top_level_blocks == 1 && self.first_block_is_paragraph {
            html.strip_prefix("<p>")
                .and_then(|h| h.strip_suffix("</p>"))
                .unwrap_or(html)
        } else {
            html
        };

        RenderedHtml {
            html: html.to_string(),
            text: self.body.trim_end_matches('\n').to_string(),
        }
    }
}

fn push_escaped(out: &mut String, s: &str) {
    let escaped = encode_text(s);
    if escaped.contains('\n') {
        out.push_str(&escaped.replace('\n', LINE_BREAK));
    } else {
        out.push_str(&escaped);
    }
}

fn overlaps(ranges: &[Range<usize>], span: Span) -> bool {
    ranges
        .iter()
        .any(|r| r.start < span.end && span.start < r.end)
}

/// Whether the byte at `at` follows an odd run of backslashes.
fn escaped_at(source: &str, at: usize) -> bool {
    source.as_bytes()[..at]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}
