//! Placeholder parsing used by the lexer.

use crate::errors::{PatternError, malformed};

use super::Placeholder;
use super::lexer::Cursor;

const INVALID: &str = "invalid placeholder in step pattern";
const UNCLOSED: &str = "missing closing '}' for placeholder";

fn read_while(chars: &mut Cursor<'_>, mut accept: impl FnMut(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if !accept(ch) {
            break;
        }
        out.push(ch);
        chars.next();
    }
    out
}

/// Parse `{name}` or `{name:hint}` after the opening brace at `start` has
/// been consumed.
pub(crate) fn parse_placeholder(
    chars: &mut Cursor<'_>,
    start: usize,
) -> Result<Placeholder, PatternError> {
    let name = read_while(chars, |ch| ch.is_ascii_alphanumeric() || ch == '_');

    let hint = if chars.next_if(|&(_, ch)| ch == ':').is_some() {
        let raw = read_while(chars, |ch| ch != '}');
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c == '{') {
            return Err(malformed(INVALID, start, Some(name)));
        }
        Some(raw)
    } else {
        None
    };

    match chars.next() {
        Some((_, '}')) => Ok(Placeholder {
            name,
            hint,
            position: start,
        }),
        Some(_) => Err(malformed(INVALID, start, Some(name))),
        None => Err(malformed(UNCLOSED, start, Some(name))),
    }
}
