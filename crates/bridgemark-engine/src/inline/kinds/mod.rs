//! # Inline Kinds
//!
//! Types that own the Discord-specific delimiter bytes. The parser refers to
//! these constants and never hardcodes `||` or `<@`.
//!
//! - **`Spoiler`**: `TEXT = "||"` and its bytes `DELIM`
//! - **`MentionTag`**: `OPEN`, `CLOSE` and the per-kind sigils

pub mod mention_tag;
pub mod spoiler;

pub use mention_tag::MentionTag;
pub use spoiler::Spoiler;
