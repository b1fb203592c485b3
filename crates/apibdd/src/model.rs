//! Parsed scenario text: features, scenarios and step lines.
//!
//! Values are built once by a [`FeatureSource`](crate::source::FeatureSource)
//! and never mutated while scenarios run.

use apibdd_patterns::StepKeyword;

use crate::tags::{extend_tag_set, merge_tag_sets};

/// One step line of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Keyword as written, conjunctions included.
    pub keyword: StepKeyword,
    /// Step text following the keyword.
    pub text: String,
    /// One-based line in the feature file, or zero when unknown.
    pub line: u32,
}

impl Step {
    /// Build a step with no source location.
    #[must_use]
    pub fn new(keyword: StepKeyword, text: impl Into<String>) -> Self {
        Self {
            keyword,
            text: text.into(),
            line: 0,
        }
    }
}

/// An ordered list of steps forming one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario title.
    pub name: String,
    /// One-based line of the `Scenario:` keyword, or zero when unknown.
    pub line: u32,
    /// Normalised scenario-level tags.
    pub tags: Vec<String>,
    /// Steps in declaration order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Build an untagged scenario from its steps.
    ///
    /// # Examples
    /// ```
    /// use apibdd::{Scenario, Step, StepKeyword};
    ///
    /// let scenario = Scenario::new(
    ///     "rejects a forged hash",
    ///     vec![Step::new(StepKeyword::Given, "I have invalid Marvel API credentials")],
    /// )
    /// .with_tags(["smoke"]);
    /// assert_eq!(scenario.tags, ["@smoke"]);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            line: 0,
            tags: Vec::new(),
            steps,
        }
    }

    /// Add tags, normalising them to `@tag` form.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let additions: Vec<String> = tags.into_iter().map(Into::into).collect();
        extend_tag_set(&mut self.tags, &additions);
        self
    }
}

/// A named group of scenarios read from one feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature title.
    pub name: String,
    /// Free-text narrative below the title, if any.
    pub description: Option<String>,
    /// Path of the source file as displayed in reports.
    pub path: String,
    /// Normalised feature-level tags.
    pub tags: Vec<String>,
    /// Scenarios in declaration order.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Build an untagged feature with no narrative.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>, scenarios: Vec<Scenario>) -> Self {
        Self {
            name: name.into(),
            description: None,
            path: path.into(),
            tags: Vec::new(),
            scenarios,
        }
    }

    /// Add feature-level tags, normalising them to `@tag` form.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let additions: Vec<String> = tags.into_iter().map(Into::into).collect();
        extend_tag_set(&mut self.tags, &additions);
        self
    }

    /// Feature tags followed by the scenario's own tags.
    #[must_use]
    pub fn effective_tags(&self, scenario: &Scenario) -> Vec<String> {
        merge_tag_sets(&self.tags, &scenario.tags)
    }
}
