//! Entry points used by the bridge when relaying a message.

use crate::content::MessageContent;
use crate::directory::{Directory, MessageHistory};
use crate::escape::Escaper;
use crate::inbound::HtmlWalker;
use crate::mention::MentionResolver;
use crate::model::FormatterContext;
use crate::options::FormatterOptions;
use crate::outbound::render_markdown;

/// Converts messages between Matrix and Discord.
///
/// Owns the compiled matchers and options; both are read-only after
/// construction, so one `Formatter` can serve concurrent conversions.
pub struct Formatter<D> {
    directory: D,
    options: FormatterOptions,
    escaper: Escaper,
}

impl<D: Directory + MessageHistory> Formatter<D> {
    pub fn new(directory: D, options: FormatterOptions) -> Self {
        Self {
            directory,
            options,
            escaper: Escaper::new(),
        }
    }

    /// Matrix to Discord.
    pub fn render_inbound(&self, ctx: &FormatterContext<'_>, content: &MessageContent) -> String {
        let out = match content.html_body() {
            Some(html) => {
                HtmlWalker::new(&self.escaper, &self.directory, &self.options).convert(html, ctx)
            }
            None => self.escaper.escape(&content.body),
        };
        log::trace!(
            "inbound for {}: {} bytes in, {} bytes out",
            ctx.user.mxid,
            content.html_body().map_or(content.body.len(), str::len),
            out.len()
        );
        out
    }

    /// Discord to Matrix.
    pub fn render_outbound(&self, ctx: &FormatterContext<'_>, text: &str) -> MessageContent {
        let resolver = MentionResolver::new(&self.directory, &self.options);
        let content = render_markdown(&self.escaper, &resolver, text);
        log::trace!(
            "outbound for {}: {} bytes in, formatted: {}",
            ctx.user.mxid,
            text.len(),
            content.formatted_body.is_some()
        );
        content
    }
}
