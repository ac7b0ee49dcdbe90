use serde::{Deserialize, Serialize};

/// Tunables for both conversion directions.
///
/// Loaded once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterOptions {
    /// Spaces a tab expands to inside code blocks.
    pub tab_width: usize,
    /// Emitted for `<br>`.
    pub newline: String,
    /// Emitted for `<hr>`.
    pub horizontal_rule: String,
    /// Prefix of message permalinks, without a trailing slash.
    pub permalink_base: String,
    /// Stands in for the guild id in permalinks to private channels.
    pub private_channel_placeholder: String,
    /// Prefix of outbound pill links.
    pub matrix_to_base: String,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            newline: "\n".to_string(),
            horizontal_rule: "\n---\n".to_string(),
            permalink_base: "https://discord.com/channels".to_string(),
            private_channel_placeholder: "@me".to_string(),
            matrix_to_base: "https://matrix.to/#/".to_string(),
        }
    }
}
