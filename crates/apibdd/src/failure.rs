//! Scenario-scoped failures.
//!
//! Everything here is caught at the scenario boundary and recorded on the
//! scenario result. None of it aborts a run.

use apibdd_patterns::StepKeyword;
use thiserror::Error;

use crate::transport::TransportError;
use crate::validator::ValidationError;

/// A step line could not be bound to exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No binding matches the step text.
    #[error("undefined step: {keyword} {text}")]
    Undefined {
        /// Effective keyword used for lookup.
        keyword: StepKeyword,
        /// Step text.
        text: String,
    },
    /// More than one binding matches the step text.
    #[error("ambiguous step: {keyword} {text} matches {}", patterns.join(", "))]
    Ambiguous {
        /// Effective keyword used for lookup.
        keyword: StepKeyword,
        /// Step text.
        text: String,
        /// Competing patterns, sorted.
        patterns: Vec<String>,
    },
}

/// Reason a step did not succeed.
#[derive(Debug, Error)]
pub enum StepFailure {
    /// The step text did not resolve to a single handler.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The HTTP request produced no status code.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A response check failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A captured argument was missing or did not parse.
    #[error("argument {index}: {message}")]
    Argument {
        /// Zero-based capture index.
        index: usize,
        /// What went wrong.
        message: String,
    },
    /// A handler precondition did not hold.
    #[error("{0}")]
    Assertion(String),
    /// The handler panicked.
    #[error("step panicked: {message}")]
    Panicked {
        /// Rendered panic payload.
        message: String,
    },
}

impl StepFailure {
    /// Build an [`Assertion`](Self::Assertion) failure.
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}
