/// Discord spoiler delimiter. The same token opens and closes.
pub struct Spoiler;

impl Spoiler {
    pub const TEXT: &'static str = "||";
    pub const DELIM: &'static [u8] = Self::TEXT.as_bytes();
}
