//! Pattern compilation errors.

use thiserror::Error;

/// A step pattern could not be turned into a regular expression.
///
/// # Examples
/// ```
/// use apibdd_patterns::{PatternError, StepPattern};
///
/// let Err(PatternError::Malformed { placeholder, position, .. }) =
///     StepPattern::compile("I receive a {status:} status code")
/// else {
///     panic!("an empty hint is malformed");
/// };
/// assert_eq!(placeholder.as_deref(), Some("status"));
/// assert_eq!(position, 12);
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// Brace or placeholder syntax is wrong.
    #[error("{reason} at byte {position}{}", describe(placeholder.as_deref()))]
    Malformed {
        /// What is wrong.
        reason: &'static str,
        /// Zero-based byte offset of the offending brace.
        position: usize,
        /// Placeholder name, once one had been read.
        placeholder: Option<String>,
    },
    /// The generated expression was rejected by the regex engine.
    #[error("step pattern is too complex: {0}")]
    Regex(#[from] regex::Error),
}

fn describe(placeholder: Option<&str>) -> String {
    placeholder.map_or_else(String::new, |name| format!(" (placeholder `{name}`)"))
}

pub(crate) fn malformed(
    reason: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Malformed {
        reason,
        position,
        placeholder,
    }
}
