/// Token escaping so raw words survive gram-key encoding.
///
/// | raw | encoded |
/// |-----|---------|
/// | `\` | `\\`    |
/// | `:` | `\c`    |
/// | `*` | `\a`    |
/// | `BEGIN` / `END` (whole token) | `\BEGIN` / `\END` |

use crate::schema::token::{is_sentinel, KEY_DELIMITER};

const ESCAPE: char = '\\';
const WILDCARD_CHAR: char = '*';

/// Escape a raw token. Backslash is handled first so later substitutions
/// are never escaped twice.
pub fn encode(token: &str) -> String {
    if is_sentinel(token) {
        return format!("{}{}", ESCAPE, token);
    }

    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            ESCAPE => out.push_str("\\\\"),
            KEY_DELIMITER => out.push_str("\\c"),
            WILDCARD_CHAR => out.push_str("\\a"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`encode`]. A backslash before any other character is dropped.
pub fn decode(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != ESCAPE {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('c') => out.push(KEY_DELIMITER),
            Some('a') => out.push(WILDCARD_CHAR),
            Some(other) => out.push(other),
            None => out.push(ESCAPE),
        }
    }
    out
}
