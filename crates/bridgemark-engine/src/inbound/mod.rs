//! # Inbound transcoding
//!
//! Matrix HTML to Discord markdown. The HTML is parsed into a DOM with
//! html5ever and converted bottom-up: inline elements become [`StyledSpan`]s
//! handed to [`SpanConverter`], structural elements (paragraphs, quotes,
//! lists, headings, code blocks) are laid out here.
//!
//! Block elements are separated from their neighbours by a newline, `p` by a
//! blank line. Raw newlines in text outside `pre` are HTML whitespace and are
//! dropped.

pub mod span;

use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::directory::{Directory, MessageHistory};
use crate::escape::Escaper;
use crate::mention::parse_matrix_uri;
use crate::model::FormatterContext;
use crate::options::FormatterOptions;

pub use span::{SpanConverter, StyledSpan};

pub struct HtmlWalker<'f, D> {
    spans: SpanConverter<'f, D>,
}

impl<'f, D: Directory + MessageHistory> HtmlWalker<'f, D> {
    pub fn new(escaper: &'f Escaper, directory: &'f D, options: &'f FormatterOptions) -> Self {
        Self {
            spans: SpanConverter::new(escaper, directory, options),
        }
    }

    /// Converts an HTML fragment, trimming surrounding newlines.
    pub fn convert(&self, html: &str, ctx: &FormatterContext<'_>) -> String {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        let out = self.node(&dom.document, ctx);
        out.trim_matches('\n').to_string()
    }

    fn node(&self, handle: &Handle, ctx: &FormatterContext<'_>) -> String {
        match &handle.data {
            NodeData::Document => self.children(handle, ctx),
            NodeData::Text { contents } => {
                let text: String = contents.borrow().chars().filter(|&c| c != '\n').collect();
                self.spans.convert(StyledSpan::PlainText(text), ctx)
            }
            NodeData::Element { name, attrs, .. } => {
                self.element(handle, &name.local, &attrs.borrow(), ctx)
            }
            _ => String::new(),
        }
    }

    fn element(
        &self,
        handle: &Handle,
        tag: &str,
        attrs: &[Attribute],
        ctx: &FormatterContext<'_>,
    ) -> String {
        let span = match tag {
            "b" | "strong" => StyledSpan::Bold(self.children(handle, ctx)),
            "i" | "em" => StyledSpan::Italic(self.children(handle, ctx)),
            "u" => StyledSpan::Underline(self.children(handle, ctx)),
            "del" | "s" | "strike" => StyledSpan::Strikethrough(self.children(handle, ctx)),
            "code" => StyledSpan::Monospace(self.children(handle, ctx)),
            "span" if attr(attrs, "data-mx-spoiler").is_some() => StyledSpan::Spoiler {
                reason: attr(attrs, "data-mx-spoiler").map(str::to_string),
                content: self.children(handle, ctx),
            },
            "br" => StyledSpan::LineBreak,
            "hr" => StyledSpan::HorizontalRule,
            "a" => return self.link(handle, attrs, ctx),
            "img" => return self.image(attrs),
            "pre" => return self.code_block(handle),
            "blockquote" => return self.blockquote(handle, ctx),
            "ul" => return self.list(handle, None, ctx),
            "ol" => {
                let start = attr(attrs, "start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                return self.list(handle, Some(start), ctx);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(tag.as_bytes()[1] - b'0');
                return self.heading(handle, level, ctx);
            }
            "mx-reply" | "head" | "script" | "style" | "title" => return String::new(),
            _ => return self.children(handle, ctx),
        };
        self.spans.convert(span, ctx)
    }

    /// Converts and joins child nodes, inserting block separators.
    fn children(&self, handle: &Handle, ctx: &FormatterContext<'_>) -> String {
        let mut out = String::new();
        let mut pending_break = 0;

        for child in handle.children.borrow().iter() {
            let converted = self.node(child, ctx);
            match block_separation(child) {
                Some(sep) => {
                    let text = converted.trim_matches('\n');
                    if text.is_empty() {
                        continue;
                    }
                    if !out.is_empty() {
                        out.truncate(out.trim_end_matches(' ').len());
                        ensure_trailing_newlines(&mut out, sep.max(pending_break));
                    }
                    out.push_str(text);
                    pending_break = sep;
                }
                None => {
                    if converted.is_empty() {
                        continue;
                    }
                    if pending_break > 0 {
                        if converted.trim().is_empty() {
                            continue;
                        }
                        let lead = converted.len() - converted.trim_start_matches('\n').len();
                        ensure_trailing_newlines(&mut out, pending_break.saturating_sub(lead));
                        pending_break = 0;
                    }
                    out.push_str(&converted);
                }
            }
        }
        out
    }

    fn link(&self, handle: &Handle, attrs: &[Attribute], ctx: &FormatterContext<'_>) -> String {
        let text = self.children(handle, ctx);
        let Some(href) = attr(attrs, "href").filter(|h| !h.is_empty()) else {
            return text;
        };

        if let Some(uri) = parse_matrix_uri(href) {
            let mention = self.spans.convert(
                StyledSpan::Mention {
                    display: text.clone(),
                    reference: uri.identifier,
                    event_id: uri.event_id,
                },
                ctx,
            );
            if !mention.is_empty() {
                return mention;
            }
        }

        if text.is_empty() {
            return self.spans.escaper().escape(href);
        }
        if text_content(handle) == href {
            return text;
        }
        format!("{text} ({})", self.spans.escaper().escape(href))
    }

    fn image(&self, attrs: &[Attribute]) -> String {
        let alt = attr(attrs, "alt").filter(|s| !s.is_empty());
        let title = attr(attrs, "title").filter(|s| !s.is_empty());

        if attr(attrs, "data-mx-emoticon").is_some()
            && let Some(name) = title
                .or(alt)
                .map(|n| n.trim_matches(':'))
                .filter(|n| !n.is_empty())
        {
            return format!(":{name}:");
        }
        alt.or(title)
            .map(|s| self.spans.escaper().escape(s))
            .unwrap_or_default()
    }

    fn code_block(&self, handle: &Handle) -> String {
        let language = code_language(handle).unwrap_or_default();
        let tab = " ".repeat(self.spans.options().tab_width);
        let code = text_content(handle).replace('\t', &tab);
        format!("```{language}\n{}\n```", code.trim_end_matches('\n'))
    }

    fn blockquote(&self, handle: &Handle, ctx: &FormatterContext<'_>) -> String {
        let content = self.children(handle, ctx);
        let content = content.trim_matches('\n');
        if content.is_empty() {
            return String::new();
        }
        content
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `start` is set for ordered lists.
    fn list(&self, handle: &Handle, start: Option<i64>, ctx: &FormatterContext<'_>) -> String {
        let mut number = start;
        let mut items = vec![];
        for child in handle.children.borrow().iter() {
            if !is_element(child, "li") {
                continue;
            }
            let marker = match number.as_mut() {
                Some(n) => {
                    let marker = format!("{n}. ");
                    *n = n.saturating_add(1);
                    marker
                }
                None => "- ".to_string(),
            };
            let content = self.children(child, ctx);
            items.push(list_item(&marker, content.trim_matches('\n')));
        }
        items.join("\n")
    }

    fn heading(&self, handle: &Handle, level: usize, ctx: &FormatterContext<'_>) -> String {
        let content = self.children(handle, ctx);
        let content = content.trim_matches('\n');
        if content.trim().is_empty() {
            return String::new();
        }
        format!("{} {content}", "#".repeat(level.min(3)))
    }
}

/// Newlines required between this node and its neighbours, if it is a block.
fn block_separation(handle: &Handle) -> Option<usize> {
    let NodeData::Element { name, .. } = &handle.data else {
        return None;
    };
    match &*name.local {
        "p" => Some(2),
        "div" | "blockquote" | "pre" | "ul" | "ol" | "li" | "h1" | "h2" | "h3" | "h4" | "h5"
        | "h6" => Some(1),
        _ => None,
    }
}

fn ensure_trailing_newlines(out: &mut String, n: usize) {
    let have = out.len() - out.trim_end_matches('\n').len();
    for _ in have..n {
        out.push('\n');
    }
}

/// Prefixes the first line with `marker` and indents the rest to match.
fn list_item(marker: &str, content: &str) -> String {
    let indent = " ".repeat(marker.len());
    let mut out = String::from(marker);
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| &*a.value)
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if &*name.local == tag)
}

fn text_content(handle: &Handle) -> String {
    fn collect(handle: &Handle, out: &mut String) {
        match &handle.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            _ => {
                for child in handle.children.borrow().iter() {
                    collect(child, out);
                }
            }
        }
    }
    let mut out = String::new();
    collect(handle, &mut out);
    out
}

/// The `language-x` class of a `code` child, if any.
fn code_language(pre: &Handle) -> Option<String> {
    pre.children.borrow().iter().find_map(|child| {
        let NodeData::Element { name, attrs, .. } = &child.data else {
            return None;
        };
        if &*name.local != "code" {
            return None;
        }
        let attrs = attrs.borrow();
        attr(&attrs, "class")?
            .split_whitespace()
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string)
    })
}
