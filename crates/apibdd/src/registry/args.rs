//! Positional arguments captured from a step line.

use std::fmt::Display;
use std::str::FromStr;

use crate::failure::StepFailure;

/// Values captured by a step pattern's placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    values: Vec<String>,
}

impl StepArgs {
    /// Wrap captured values.
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw text of capture `index`.
    ///
    /// # Errors
    /// Returns [`StepFailure::Argument`] when the pattern has fewer
    /// placeholders.
    pub fn get(&self, index: usize) -> Result<&str, StepFailure> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| StepFailure::Argument {
                index,
                message: format!("step captured only {} value(s)", self.values.len()),
            })
    }

    /// Parse capture `index` with [`FromStr`].
    ///
    /// # Errors
    /// Returns [`StepFailure::Argument`] when the value is absent or does not
    /// parse.
    ///
    /// # Examples
    /// ```
    /// use apibdd::StepArgs;
    ///
    /// let args = StepArgs::new(vec!["401".into()]);
    /// assert_eq!(args.parse::<u16>(0).ok(), Some(401));
    /// assert!(args.parse::<u16>(1).is_err());
    /// ```
    pub fn parse<T>(&self, index: usize) -> Result<T, StepFailure>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get(index)?;
        raw.parse().map_err(|err: T::Err| StepFailure::Argument {
            index,
            message: format!("failed to parse '{raw}': {err}"),
        })
    }

    /// All captured values.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.values
    }
}
