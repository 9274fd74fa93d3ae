//! IRC case mapping.
//!
//! Channel and nickname comparisons on IRC are case-insensitive under the
//! `rfc1459` mapping, where `[]\~` are the uppercase forms of `{}|^`.

/// Lowercase a single character under `rfc1459` case mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        'A'..='Z' => (c as u8 + 32) as char,
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Lowercase a string under `rfc1459` case mapping.
///
/// Used to build map keys for nicknames and channels.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality under `rfc1459` case mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .map(irc_lower_char)
            .eq(b.chars().map(irc_lower_char))
}
