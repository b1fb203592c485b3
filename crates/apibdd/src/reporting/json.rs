//! JSON writer for scenario outcome records.
//!
//! Status labels are lowercase. `failure` appears only on failed scenarios
//! and `skip` only on skipped ones.

use std::io::Write;

use serde::Serialize;

use super::ScenarioRecord;
use crate::result::ScenarioStatus;

#[derive(Serialize)]
struct JsonReport<'a> {
    scenarios: Vec<JsonScenario<'a>>,
}

#[derive(Serialize)]
struct JsonScenario<'a> {
    feature: &'a str,
    feature_path: &'a str,
    scenario: &'a str,
    status: &'static str,
    line: u32,
    tags: &'a [String],
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<JsonFailure<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<JsonSkip<'a>>,
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    index: usize,
    keyword: Option<&'static str>,
    text: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonSkip<'a> {
    tag: &'a str,
    forced_failure: bool,
}

impl<'a> From<&'a [ScenarioRecord]> for JsonReport<'a> {
    fn from(records: &'a [ScenarioRecord]) -> Self {
        let scenarios = records.iter().map(JsonScenario::from).collect();
        Self { scenarios }
    }
}

impl<'a> From<&'a ScenarioRecord> for JsonScenario<'a> {
    fn from(record: &'a ScenarioRecord) -> Self {
        let (failure, skip) = match record.status() {
            ScenarioStatus::Passed => (None, None),
            ScenarioStatus::Failed(details) => (
                Some(JsonFailure {
                    index: details.index,
                    keyword: details.keyword.map(|keyword| keyword.as_str()),
                    text: &details.text,
                    message: &details.message,
                }),
                None,
            ),
            ScenarioStatus::Skipped(details) => (
                None,
                Some(JsonSkip {
                    tag: details.tag(),
                    forced_failure: details.forced_failure(),
                }),
            ),
        };
        Self {
            feature: record.feature(),
            feature_path: record.feature_path(),
            scenario: record.scenario_name(),
            status: record.status().label(),
            line: record.line(),
            tags: record.tags(),
            duration_ms: u64::try_from(record.duration().as_millis()).unwrap_or(u64::MAX),
            failure,
            skip,
        }
    }
}

/// Serialize `records` into `writer`.
///
/// # Errors
/// Returns an error when serialization or writing fails.
pub fn write<W: Write>(writer: &mut W, records: &[ScenarioRecord]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &JsonReport::from(records))
}

/// Serialize `records` into a compact string.
///
/// # Examples
/// ```
/// use apibdd::ScenarioStatus;
/// use apibdd::reporting::{ScenarioRecord, json};
///
/// let records = vec![ScenarioRecord::new("f.feature", "s", 1, Vec::new(), ScenarioStatus::Passed)];
/// let json = json::to_string(&records).expect("records serialize");
/// assert!(json.contains("\"status\":\"passed\""));
/// ```
///
/// # Errors
/// Returns an error when serialization fails.
pub fn to_string(records: &[ScenarioRecord]) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport::from(records))
}
