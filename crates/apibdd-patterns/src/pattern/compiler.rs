//! Convert lexed tokens into anchored regular-expression sources.

use crate::errors::{PatternError, malformed};
use crate::hint::TypeHint;

use super::lexer::{Token, lex_pattern};

/// Build an anchored regular expression source from a step pattern.
///
/// # Errors
/// Returns [`PatternError`] when the pattern contains malformed placeholders
/// or unbalanced stray braces.
///
/// # Examples
/// ```
/// use apibdd_patterns::build_regex_from_pattern;
///
/// let source = build_regex_from_pattern("I receive a {status:u16} status code")
///     .expect("pattern is valid");
/// assert_eq!(source, r"^I receive a (\d+) status code$");
/// ```
pub fn build_regex_from_pattern(pattern: &str) -> Result<String, PatternError> {
    let tokens = lex_pattern(pattern)?;
    let mut regex = String::with_capacity(pattern.len().saturating_mul(2) + 2);
    regex.push('^');
    let mut stray_depth = 0usize;
    let mut after_quote = false;
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let opens_quote = matches!(&token, Token::Literal(text) if text.ends_with('"'));
        match token {
            Token::Literal(text) => regex.push_str(&regex::escape(&text)),
            Token::Placeholder(placeholder) => {
                let hint = TypeHint::from_hint(placeholder.hint.as_deref());
                let before_quote =
                    matches!(tokens.peek(), Some(Token::Literal(next)) if next.starts_with('"'));
                regex.push('(');
                regex.push_str(if after_quote && before_quote {
                    hint.quoted_regex()
                } else {
                    hint.regex()
                });
                regex.push(')');
            }
            Token::OpenBrace { .. } => {
                stray_depth = stray_depth.saturating_add(1);
                regex.push_str(r"\{");
            }
            Token::CloseBrace { index } => {
                stray_depth = stray_depth.checked_sub(1).ok_or_else(|| {
                    malformed("unmatched closing brace '}' in step pattern", index, None)
                })?;
                regex.push_str(r"\}");
            }
        }
        after_quote = opens_quote;
    }

    if stray_depth != 0 {
        return Err(malformed(
            "unbalanced braces in step pattern",
            pattern.len(),
            None,
        ));
    }

    regex.push('$');
    Ok(regex)
}
