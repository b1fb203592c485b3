//! Scenario reporting collector.
//!
//! A [`Collector`] is a [`ResultSink`] that keeps a flat record of every
//! scenario outcome. The [`junit`] and [`json`] writers render those records
//! for CI systems once the run has finished.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::result::{ScenarioResult, ScenarioStatus};
use crate::runner::ResultSink;

/// JSON report writer for scenario outcomes.
pub mod json;
/// JUnit XML writer for scenario outcomes.
pub mod junit;

/// Outcome recorded for a single scenario execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioRecord {
    feature: String,
    feature_path: String,
    scenario_name: String,
    line: u32,
    tags: Vec<String>,
    status: ScenarioStatus,
    duration: Duration,
}

impl ScenarioRecord {
    /// Construct a record for the provided scenario metadata.
    ///
    /// # Examples
    /// ```
    /// use apibdd::ScenarioStatus;
    /// use apibdd::reporting::ScenarioRecord;
    ///
    /// let record = ScenarioRecord::new(
    ///     "features/api_authentication.feature",
    ///     "Fail to retrieve comics with invalid API key",
    ///     17,
    ///     vec!["@auth".into()],
    ///     ScenarioStatus::Passed,
    /// );
    /// assert_eq!(record.line(), 17);
    /// assert_eq!(record.status().label(), "passed");
    /// ```
    #[must_use]
    pub fn new(
        feature_path: impl Into<String>,
        scenario_name: impl Into<String>,
        line: u32,
        tags: Vec<String>,
        status: ScenarioStatus,
    ) -> Self {
        Self {
            feature: String::new(),
            feature_path: feature_path.into(),
            scenario_name: scenario_name.into(),
            line,
            tags,
            status,
            duration: Duration::ZERO,
        }
    }

    /// Feature title, empty when unknown.
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Feature file path.
    #[must_use]
    pub fn feature_path(&self) -> &str {
        &self.feature_path
    }

    /// Scenario title.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Line of the scenario keyword.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Effective tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Terminal status.
    #[must_use]
    pub fn status(&self) -> &ScenarioStatus {
        &self.status
    }

    /// Time spent running the scenario.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl From<&ScenarioResult> for ScenarioRecord {
    fn from(result: &ScenarioResult) -> Self {
        Self {
            feature: result.feature.clone(),
            feature_path: result.feature_path.clone(),
            scenario_name: result.scenario.clone(),
            line: result.line,
            tags: result.tags.clone(),
            status: result.status.clone(),
            duration: result.duration,
        }
    }
}

/// Thread-safe store of scenario records gathered during a run.
#[derive(Debug, Default)]
pub struct Collector {
    records: Mutex<Vec<ScenarioRecord>>,
}

impl Collector {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ScenarioRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a record.
    pub fn record(&self, record: ScenarioRecord) {
        self.lock().push(record);
    }

    /// Copy of the records collected so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ScenarioRecord> {
        self.lock().clone()
    }

    /// Remove and return every record.
    #[must_use]
    pub fn drain(&self) -> Vec<ScenarioRecord> {
        self.lock().drain(..).collect()
    }
}

impl ResultSink for Collector {
    fn on_scenario(&self, result: &ScenarioResult) {
        self.record(ScenarioRecord::from(result));
    }
}

#[cfg(test)]
mod tests;
