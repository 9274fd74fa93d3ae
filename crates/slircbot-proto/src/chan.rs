//! Channel name validation.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

/// Longest channel name accepted, prefix included.
pub const MAX_CHANNEL_LEN: usize = 50;

/// Extension trait for checking channel name syntax.
pub trait ChannelExt {
    /// Whether this string is a syntactically valid channel name.
    ///
    /// A channel name starts with one of `#&+!`, is at most
    /// [`MAX_CHANNEL_LEN`] characters, and contains no space, comma,
    /// BEL or other control character.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        let mut chars = self.chars();
        if !matches!(chars.next(), Some('#' | '&' | '+' | '!')) {
            return false;
        }
        if self.chars().count() > MAX_CHANNEL_LEN {
            return false;
        }
        chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}
