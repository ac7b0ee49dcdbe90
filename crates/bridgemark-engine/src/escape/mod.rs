//! # Escaping
//!
//! Discord markdown has no raw-text mode, so literal text bridged from Matrix
//! must have every delimiter character backslash-escaped. Links are the
//! exception: Discord autolinks them before parsing markdown, so an escaped
//! underscore inside a URL would end up in the link target.
//!
//! - [`Escaper::escape`]: escape everything outside detected links
//! - [`Escaper::unescape`]: drop one backslash before any character
//! - [`Escaper::fix_ambiguous_escape`]: repair `\__x` / `\**x` before parsing
//!
//! All matchers are compiled once in [`Escaper::new`] and only read afterwards.

use std::ops::Range;

use regex::{Captures, Regex};

/// Characters that double as Discord markdown delimiters.
pub const ESCAPE_TOKENS: [char; 7] = ['\\', '_', '*', '~', '`', '|', '<'];

/// Discord links start with `http://` or `https://`, have at least two more
/// characters, contain no `<` or space separator, and do not end in
/// `"'),.:;]`. U+FEFF counts as a space separator for Discord.
const LINK_PATTERN: &str = r#"https?://[^<\p{Zs}\x{FEFF}]+[^"'),.:;\]\p{Zs}\x{FEFF}]"#;

/// An escaped double delimiter followed by something that could start an
/// emphasis run.
const AMBIGUOUS_ESCAPE_PATTERN: &str = r"\\(__[^_]|\*\*[^*])";

const ESCAPED_CHAR_PATTERN: &str = r"\\(.)";

#[derive(Debug, Clone)]
pub struct Escaper {
    link: Regex,
    ambiguous: Regex,
    escaped_char: Regex,
}

impl Default for Escaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Escaper {
    pub fn new() -> Self {
        Self {
            link: Regex::new(LINK_PATTERN).expect("link pattern compiles"),
            ambiguous: Regex::new(AMBIGUOUS_ESCAPE_PATTERN).expect("ambiguity pattern compiles"),
            escaped_char: Regex::new(ESCAPED_CHAR_PATTERN).expect("escape pattern compiles"),
        }
    }

    /// Byte ranges of the links Discord would autolink in `s`.
    pub fn links<'s>(&'s self, s: &'s str) -> impl Iterator<Item = Range<usize>> + 's {
        self.link.find_iter(s).map(|m| m.range())
    }

    /// Escapes markdown delimiters outside of links.
    pub fn escape(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + s.len() / 8);
        let mut offset = 0;
        for link in self.links(s) {
            push_escaped(&mut out, &s[offset..link.start]);
            out.push_str(&s[link.clone()]);
            offset = link.end;
        }
        push_escaped(&mut out, &s[offset..]);
        out
    }

    /// Removes one level of backslash escaping from any character.
    pub fn unescape(&self, s: &str) -> String {
        self.escaped_char.replace_all(s, "$1").into_owned()
    }

    /// Splits `\__x` into `\_\_x` (and likewise for `**`).
    ///
    /// Left alone, a markdown parser reads the escaped first delimiter as a
    /// literal and the second one as the start of an emphasis run.
    pub fn fix_ambiguous_escape(&self, s: &str) -> String {
        self.ambiguous
            .replace_all(s, |caps: &Captures<'_>| {
                let m = &caps[0];
                format!("{}\\{}", &m[..2], &m[2..])
            })
            .into_owned()
    }
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        if ESCAPE_TOKENS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
