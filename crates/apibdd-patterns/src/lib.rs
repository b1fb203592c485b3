//! Step keyword and step-pattern compilation for `apibdd`.
//!
//! Step definitions are written as plain sentences with `{name}` or
//! `{name:hint}` placeholders. This crate turns those sentences into anchored
//! regular expressions and extracts the positional arguments a concrete step
//! line supplies. It performs no I/O and knows nothing about HTTP.

mod capture;
mod errors;
mod hint;
mod keyword;
mod pattern;

pub use capture::extract_captured_values;
pub use errors::PatternError;
pub use hint::TypeHint;
pub use keyword::{StepKeyword, StepKeywordParseError};
pub use pattern::{Placeholder, StepPattern, build_regex_from_pattern};
