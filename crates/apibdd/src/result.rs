//! Scenario, feature and run outcomes.
//!
//! Results are built by the executor when a scenario reaches a terminal
//! state and are immutable afterwards.

use std::fmt;
use std::time::Duration;

use apibdd_patterns::StepKeyword;

/// Outcome of a single step line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The handler returned `Ok`.
    Passed,
    /// Resolution or the handler failed.
    Failed {
        /// Rendered failure.
        message: String,
    },
    /// An earlier step failed, or the scenario was skipped.
    NotRun,
}

impl StepOutcome {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::NotRun => "not run",
        }
    }
}

/// A step line together with its outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Keyword as written in the scenario.
    pub keyword: StepKeyword,
    /// Step text.
    pub text: String,
    /// What happened.
    pub outcome: StepOutcome,
}

/// The first and only failure of a failed scenario.
///
/// Hook failures carry no keyword; their `text` names the hook and `index`
/// is the position the scenario had reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailureRecord {
    /// Zero-based step index.
    pub index: usize,
    /// Keyword as written, `None` for a hook.
    pub keyword: Option<StepKeyword>,
    /// Step text or hook name.
    pub text: String,
    /// Rendered error, including expected and actual values.
    pub message: String,
}

impl StepFailureRecord {
    /// Record a failure raised by a lifecycle hook.
    #[must_use]
    pub fn hook(index: usize, hook: &str, message: impl Into<String>) -> Self {
        Self {
            index,
            keyword: None,
            text: format!("{hook} hook"),
            message: message.into(),
        }
    }
}

impl fmt::Display for StepFailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.keyword {
            Some(keyword) => write!(
                f,
                "step {} ({keyword} {}) failed: {}",
                self.index + 1,
                self.text,
                self.message
            ),
            None => write!(f, "{} failed: {}", self.text, self.message),
        }
    }
}

/// Details captured when a scenario skips.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedScenario {
    tag: String,
    forced_failure: bool,
}

impl SkippedScenario {
    /// Record a skip caused by `tag`.
    ///
    /// # Examples
    /// ```
    /// use apibdd::SkippedScenario;
    ///
    /// let skipped = SkippedScenario::new("@ignore", false);
    /// assert_eq!(skipped.tag(), "@ignore");
    /// assert_eq!(skipped.message(), "skipped by tag @ignore");
    /// ```
    #[must_use]
    pub fn new(tag: impl Into<String>, forced_failure: bool) -> Self {
        Self {
            tag: tag.into(),
            forced_failure,
        }
    }

    /// The skip tag that matched.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Human-readable reason.
    #[must_use]
    pub fn message(&self) -> String {
        format!("skipped by tag {}", self.tag)
    }

    /// Whether the skip fails the run because skips are disallowed.
    #[must_use]
    pub fn forced_failure(&self) -> bool {
        self.forced_failure
    }
}

/// Terminal status of a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScenarioStatus {
    /// Every step passed.
    Passed,
    /// A step or the teardown failed.
    Failed(StepFailureRecord),
    /// A skip tag matched before any step ran.
    Skipped(SkippedScenario),
}

impl ScenarioStatus {
    /// Lowercase label for the status.
    ///
    /// # Examples
    /// ```
    /// use apibdd::ScenarioStatus;
    ///
    /// assert_eq!(ScenarioStatus::Passed.label(), "passed");
    /// ```
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Complete record of one scenario execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioResult {
    /// Feature title.
    pub feature: String,
    /// Feature file path.
    pub feature_path: String,
    /// Scenario title.
    pub scenario: String,
    /// Line of the scenario keyword.
    pub line: u32,
    /// Effective tags.
    pub tags: Vec<String>,
    /// Terminal status.
    pub status: ScenarioStatus,
    /// One report per step line, in order.
    pub steps: Vec<StepReport>,
    /// Wall-clock time spent, hooks included.
    pub duration: Duration,
}

impl ScenarioResult {
    /// Whether the scenario passed.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed)
    }

    /// The failure record, if the scenario failed.
    #[must_use]
    pub fn failure(&self) -> Option<&StepFailureRecord> {
        match &self.status {
            ScenarioStatus::Failed(record) => Some(record),
            ScenarioStatus::Passed | ScenarioStatus::Skipped(_) => None,
        }
    }
}

/// Results of every scenario in one feature, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureResult {
    /// Feature title.
    pub name: String,
    /// Feature file path.
    pub path: String,
    /// Scenario results.
    pub scenarios: Vec<ScenarioResult>,
}

impl FeatureResult {
    fn count(&self, label: &str) -> usize {
        self.scenarios
            .iter()
            .filter(|result| result.status.label() == label)
            .count()
    }

    /// Number of passed scenarios.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count("passed")
    }

    /// Number of failed scenarios.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    /// Number of skipped scenarios.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }
}

/// Aggregate over every feature in a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Feature results, in load order.
    pub features: Vec<FeatureResult>,
}

impl RunSummary {
    /// All scenario results in run order.
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.features.iter().flat_map(|feature| &feature.scenarios)
    }

    /// Number of scenarios.
    #[must_use]
    pub fn total(&self) -> usize {
        self.features.iter().map(|f| f.scenarios.len()).sum()
    }

    /// Number of passed scenarios.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.features.iter().map(FeatureResult::passed).sum()
    }

    /// Number of failed scenarios.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.features.iter().map(FeatureResult::failed).sum()
    }

    /// Number of skipped scenarios.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.features.iter().map(FeatureResult::skipped).sum()
    }

    /// True when nothing failed and no skip was turned into a failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.scenarios().all(|result| match &result.status {
            ScenarioStatus::Passed => true,
            ScenarioStatus::Failed(_) => false,
            ScenarioStatus::Skipped(skip) => !skip.forced_failure(),
        })
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scenarios ({} passed, {} failed, {} skipped)",
            self.total(),
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}
