//! Step keyword type and conjunction resolution.

use std::fmt;
use std::str::FromStr;

/// Keyword that opens a scenario step line.
///
/// `And` and `But` never select bindings on their own: they inherit the
/// keyword of the closest preceding `Given`, `When` or `Then` through
/// [`resolve`](Self::resolve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKeyword {
    /// Establishes the preconditions of a scenario.
    Given,
    /// Performs the action under test.
    When,
    /// Checks an observable outcome.
    Then,
    /// Continues the previous primary keyword.
    And,
    /// Continues the previous primary keyword with a contrasting clause.
    But,
}

impl StepKeyword {
    /// Every keyword in canonical order.
    pub const ALL: [Self; 5] = [Self::Given, Self::When, Self::Then, Self::And, Self::But];

    /// Return the keyword as written in scenario text.
    ///
    /// # Examples
    ///
    /// ```
    /// use apibdd_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::When.as_str(), "When");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }

    /// Whether the keyword is `And` or `But`.
    #[must_use]
    pub const fn is_conjunction(self) -> bool {
        matches!(self, Self::And | Self::But)
    }

    /// Resolve conjunctions to the keyword of the previous primary step.
    ///
    /// Primary keywords update `prev` and are returned unchanged. A
    /// conjunction returns the stored keyword, or `Given` when the sequence
    /// starts with a conjunction.
    ///
    /// # Examples
    ///
    /// ```
    /// use apibdd_patterns::StepKeyword;
    ///
    /// let mut prev = None;
    /// assert_eq!(StepKeyword::When.resolve(&mut prev), StepKeyword::When);
    /// assert_eq!(StepKeyword::And.resolve(&mut prev), StepKeyword::When);
    /// assert_eq!(StepKeyword::But.resolve(&mut prev), StepKeyword::When);
    /// ```
    #[must_use]
    pub fn resolve(self, prev: &mut Option<Self>) -> Self {
        if self.is_conjunction() {
            prev.unwrap_or(Self::Given)
        } else {
            *prev = Some(self);
            self
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name a step keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid step keyword: {0}")]
pub struct StepKeywordParseError(pub String);

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|keyword| trimmed.eq_ignore_ascii_case(keyword.as_str()))
            .ok_or_else(|| StepKeywordParseError(trimmed.to_string()))
    }
}

impl TryFrom<&str> for StepKeyword {
    type Error = StepKeywordParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
