//! Unit tests for the reporting module.

use std::time::Duration;

use super::*;
use crate::StepKeyword;
use crate::result::{SkippedScenario, StepFailureRecord};
use rstest::{fixture, rstest};
use serde_json::Value;

fn failed() -> ScenarioStatus {
    ScenarioStatus::Failed(StepFailureRecord {
        index: 2,
        keyword: Some(StepKeyword::Then),
        text: "I receive a 200 status code".into(),
        message: "expected status code 200, but got 401".into(),
    })
}

#[fixture]
fn records() -> Vec<ScenarioRecord> {
    vec![
        ScenarioRecord::new("features/a.feature", "passes", 5, Vec::new(), ScenarioStatus::Passed),
        ScenarioRecord::new("features/a.feature", "fails <here>", 12, vec!["@auth".into()], failed()),
        ScenarioRecord::new(
            "features/a.feature",
            "skipped",
            20,
            vec!["@ignore".into()],
            ScenarioStatus::Skipped(SkippedScenario::new("@ignore", true)),
        ),
    ]
}

#[test]
fn collector_records_results_and_drains() {
    let collector = Collector::new();
    let result = ScenarioResult {
        feature: "API Authentication and Data Retrieval".into(),
        feature_path: "features/api_authentication.feature".into(),
        scenario: "Fail to retrieve comics with invalid API key".into(),
        line: 17,
        tags: Vec::new(),
        status: ScenarioStatus::Passed,
        steps: Vec::new(),
        duration: Duration::from_millis(12),
    };
    collector.on_scenario(&result);
    let snapshot = collector.snapshot();
    let Some(record) = snapshot.first() else {
        panic!("collector should retain the record");
    };
    assert_eq!(record.feature(), "API Authentication and Data Retrieval");
    assert_eq!(record.duration(), Duration::from_millis(12));
    assert_eq!(collector.drain().len(), 1);
    assert!(collector.snapshot().is_empty());
}

#[rstest]
fn junit_counts_failures_and_skips(records: Vec<ScenarioRecord>) {
    let mut output = String::new();
    junit::write(&mut output, &records).unwrap_or_else(|e| panic!("junit write: {e}"));
    assert!(output.contains("tests=\"3\" failures=\"2\" skipped=\"1\""));
    assert!(output.contains("name=\"fails &lt;here&gt;\""));
    assert!(output.contains(
        "<failure message=\"expected status code 200, but got 401\" type=\"step\">"
    ));
    assert!(output.contains("<skipped message=\"skipped by tag @ignore\" />"));
    assert!(output.contains("<failure type=\"fail_on_skipped\">"));
    assert!(output.ends_with("</testsuite>\n"));
}

#[test]
fn junit_replaces_invalid_xml_characters() {
    let records = vec![ScenarioRecord::new(
        "f.feature",
        "bell\u{7}",
        1,
        Vec::new(),
        ScenarioStatus::Passed,
    )];
    let mut output = String::new();
    junit::write(&mut output, &records).unwrap_or_else(|e| panic!("junit write: {e}"));
    assert!(output.contains("name=\"bell&#xFFFD;\""));
}

#[rstest]
fn json_report_has_failure_and_skip_details(records: Vec<ScenarioRecord>) {
    let text = json::to_string(&records).unwrap_or_else(|e| panic!("json: {e}"));
    let parsed: Value = serde_json::from_str(&text).unwrap_or_else(|e| panic!("valid json: {e}"));
    let scenarios = parsed
        .get("scenarios")
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("scenarios array in {text}"));
    let statuses: Vec<&str> = scenarios
        .iter()
        .filter_map(|s| s.get("status").and_then(Value::as_str))
        .collect();
    assert_eq!(statuses, ["passed", "failed", "skipped"]);

    let passed = scenarios.first().unwrap_or_else(|| panic!("first scenario"));
    assert!(passed.get("failure").is_none());
    assert!(passed.get("skip").is_none());

    let failure = scenarios
        .get(1)
        .and_then(|s| s.get("failure"))
        .unwrap_or_else(|| panic!("failure details"));
    assert_eq!(failure.get("keyword").and_then(Value::as_str), Some("Then"));
    assert_eq!(failure.get("index").and_then(Value::as_u64), Some(2));

    let skip = scenarios
        .get(2)
        .and_then(|s| s.get("skip"))
        .unwrap_or_else(|| panic!("skip details"));
    assert_eq!(skip.get("forced_failure").and_then(Value::as_bool), Some(true));
}

#[rstest]
fn json_write_produces_parseable_output(records: Vec<ScenarioRecord>) {
    let mut buffer = Vec::new();
    json::write(&mut buffer, &records).unwrap_or_else(|e| panic!("json write: {e}"));
    let parsed: Value =
        serde_json::from_slice(&buffer).unwrap_or_else(|e| panic!("valid json: {e}"));
    assert_eq!(
        parsed.pointer("/scenarios/1/tags/0").and_then(Value::as_str),
        Some("@auth")
    );
}
