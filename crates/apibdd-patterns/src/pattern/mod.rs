//! Step-pattern lexing and compilation.

mod compiler;
mod lexer;
mod placeholder;

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::capture::extract_captured_values;
use crate::errors::PatternError;
use crate::hint::TypeHint;
use lexer::{Token, lex_pattern};

pub use compiler::build_regex_from_pattern;

/// A `{name}` or `{name:hint}` slot inside a step pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Placeholder name, used in diagnostics only.
    pub name: String,
    /// Raw type hint following the colon, if any.
    pub hint: Option<String>,
    /// Byte offset of the opening brace.
    pub position: usize,
}

impl Placeholder {
    /// Classified hint for this placeholder.
    #[must_use]
    pub fn type_hint(&self) -> TypeHint {
        TypeHint::from_hint(self.hint.as_deref())
    }
}

/// A compiled step pattern.
///
/// Equality and hashing use the pattern text only, so two bindings written
/// with the same sentence compare equal regardless of when they compiled.
///
/// # Examples
/// ```
/// use apibdd_patterns::StepPattern;
///
/// let pattern = StepPattern::compile(r#"I send a GET request to "{endpoint}" endpoint"#)
///     .expect("pattern is valid");
/// assert_eq!(
///     pattern.captures(r#"I send a GET request to "characters" endpoint"#),
///     Some(vec!["characters".to_string()])
/// );
/// assert!(pattern.captures("I send a POST request").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct StepPattern {
    text: String,
    regex: Regex,
    placeholders: Vec<Placeholder>,
}

impl StepPattern {
    /// Compile pattern text into a matcher.
    ///
    /// # Errors
    /// Returns [`PatternError`] when placeholder syntax is malformed or the
    /// generated expression cannot be compiled.
    pub fn compile(text: impl Into<String>) -> Result<Self, PatternError> {
        let text = text.into();
        let placeholders = lex_pattern(&text)?
            .into_iter()
            .filter_map(|token| match token {
                Token::Placeholder(placeholder) => Some(placeholder),
                _ => None,
            })
            .collect();
        let regex = Regex::new(&build_regex_from_pattern(&text)?)?;
        Ok(Self {
            text,
            regex,
            placeholders,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The anchored regular expression generated for the pattern.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Placeholders in declaration order.
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Whether `text` matches this pattern.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Positional placeholder values when `text` matches.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        extract_captured_values(&self.regex, text)
    }
}

impl PartialEq for StepPattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for StepPattern {}

impl Hash for StepPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
