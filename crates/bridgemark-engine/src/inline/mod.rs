//! # Discord inline tokens
//!
//! pulldown-cmark knows nothing about the two Discord-only inline constructs
//! that survive CommonMark parsing as plain text: `||spoiler||` delimiters and
//! `<@id>`-style mention tags. This module finds them inside a text run.
//!
//! ## Modules
//!
//! - **`span`**: `Span`, a byte range into the text run
//! - **`kinds`**: delimiter constants (`Spoiler`, `MentionTag`)
//! - **`cursor`**: `Cursor` for byte-by-byte scanning
//! - **`types`**: `InlineToken` and `DiscordMention`
//! - **`parser`**: `parse_inline()` entry point with `try_parse_*` helpers
//!
//! Pairing spoiler delimiters is left to the renderer, because a spoiler may
//! span several text runs separated by other markup.

pub mod cursor;
pub mod kinds;
pub mod parser;
pub mod span;
pub mod types;

pub use parser::parse_inline;
pub use span::Span;
pub use types::{DiscordMention, InlineToken};
