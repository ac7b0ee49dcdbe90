//! # Outbound transcoding
//!
//! Discord markdown to Matrix content. pulldown-cmark does the block and
//! emphasis parsing; [`HtmlRenderer`] layers the Discord dialect on top of
//! its event stream:
//!
//! - raw HTML in the source is escaped, never passed through
//! - `__x__` is underline, not bold
//! - `||x||` is a spoiler
//! - `<@id>`, `<#id>`, `<@&id>` and `<:name:id>` are mentions
//! - bare links become anchors and every newline is a `<br>`

pub mod renderer;

use html_escape::encode_text;

use crate::content::MessageContent;
use crate::directory::{Directory, MessageHistory};
use crate::escape::Escaper;
use crate::mention::MentionResolver;

pub use renderer::{HtmlRenderer, RenderedHtml};

/// Renders `text` to Matrix content.
///
/// The body is a plain-text rendering of the HTML, with mentions shown by
/// name and spoilers masked. The formatted body is omitted when it would only
/// repeat the escaped body.
pub fn render_markdown<D: Directory + MessageHistory>(
    escaper: &Escaper,
    resolver: &MentionResolver<'_, D>,
    text: &str,
) -> MessageContent {
    let source = escaper.fix_ambiguous_escape(text);
    let rendered = HtmlRenderer::new(&source, escaper, resolver).render();
    if rendered.html == encode_text(&rendered.text) {
        MessageContent::plain(rendered.text)
    } else {
        MessageContent::html(rendered.text, rendered.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::model::Puppet;
    use crate::options::FormatterOptions;
    use pretty_assertions::assert_eq;

    fn render(text: &str) -> MessageContent {
        let dir = InMemoryDirectory::new().with_puppet(Puppet {
            discord_id: "42".into(),
            mxid: "@_discord_42:hs".into(),
            display_name: Some("Bob".into()),
        });
        let options = FormatterOptions::default();
        let escaper = Escaper::new();
        render_markdown(&escaper, &MentionResolver::new(&dir, &options), text)
    }

    #[test]
    fn plain_text_has_no_formatted_body() {
        assert_eq!(render("just words & things"), MessageContent::plain("just words & things"));
        assert_eq!(render("<i>not html</i>"), MessageContent::plain("<i>not html</i>"));
        assert_eq!(render(""), MessageContent::plain(""));
    }

    #[test]
    fn formatted_content_has_plain_text_body() {
        assert_eq!(
            render(r"**hi** \*x\*"),
            MessageContent::html("hi *x*", "<strong>hi</strong> *x*")
        );
        assert_eq!(render(r"\*only escapes\*"), MessageContent::plain("*only escapes*"));
    }

    #[test]
    fn mentions_use_labels_in_body() {
        assert_eq!(
            render("ping <@42>"),
            MessageContent::html(
                "ping Bob",
                r#"ping <a href="https://matrix.to/#/@_discord_42:hs">Bob</a>"#
            )
        );
    }

    #[test]
    fn unresolved_mention_that_only_changes_text_stays_plain() {
        // The role fallback appears in both body and HTML.
        assert_eq!(render("hey <@&5>"), MessageContent::plain("hey @&5"));
    }
}
