//! Nickname validation.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: nickname grammar

/// Default maximum nickname length.
///
/// Networks advertise their own limit through `NICKLEN`; 30 covers the
/// common cases.
pub const DEFAULT_NICK_MAX_LEN: usize = 30;

/// Extension trait for checking nickname syntax.
pub trait NickExt {
    /// Whether this string is a valid nickname of at most
    /// [`DEFAULT_NICK_MAX_LEN`] characters.
    ///
    /// ```
    /// use slircbot_proto::NickExt;
    ///
    /// assert!("Case".is_valid_nick());
    /// assert!("[Molly]".is_valid_nick());
    /// assert!(!"3Jane".is_valid_nick());
    /// assert!(!"nick!user".is_valid_nick());
    /// ```
    fn is_valid_nick(&self) -> bool {
        self.is_valid_nick_len(DEFAULT_NICK_MAX_LEN)
    }

    /// Whether this string is a valid nickname of at most `max_len` bytes.
    fn is_valid_nick_len(&self, max_len: usize) -> bool;
}

/// `[ ] \ ` ^ _ { | }`
#[inline]
fn is_special(c: char) -> bool {
    matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}')
}

impl NickExt for str {
    fn is_valid_nick_len(&self, max_len: usize) -> bool {
        if self.is_empty() || self.len() > max_len {
            return false;
        }
        let mut chars = self.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || is_special(first) => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
    }
}

impl NickExt for String {
    fn is_valid_nick_len(&self, max_len: usize) -> bool {
        self.as_str().is_valid_nick_len(max_len)
    }
}
