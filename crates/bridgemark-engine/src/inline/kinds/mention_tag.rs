/// Angle-bracket tags Discord uses for mentions and custom emoji:
/// `<@id>`, `<@!id>`, `<@&id>`, `<#id>`, `<:name:id>`, `<a:name:id>`.
pub struct MentionTag;

impl MentionTag {
    pub const OPEN: u8 = b'<';
    pub const CLOSE: u8 = b'>';
    pub const USER: u8 = b'@';
    /// Legacy nickname marker after `@`.
    pub const NICKNAME: u8 = b'!';
    /// Role marker after `@`.
    pub const ROLE: u8 = b'&';
    pub const CHANNEL: u8 = b'#';
    pub const EMOJI: u8 = b':';
    pub const ANIMATED: u8 = b'a';

    pub fn is_snowflake_byte(b: u8) -> bool {
        b.is_ascii_digit()
    }

    pub fn is_emoji_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_'
    }
}
