//! Behavioural tests running the reference feature against an in-process API.
//!
//! The fake API checks every signature, so the invalid-credentials scenario
//! only passes when the substituted private key actually reaches the signer.

mod support;

use std::path::Path;
use std::sync::Arc;

use apibdd::reporting::Collector;
use apibdd::source::parse_feature;
use apibdd::{
    FeatureRunner, FeatureSource, GherkinFiles, ResolveError, RunnerOptions, ScenarioStatus,
    StepFailure, StepKeyword, StepOutcome, api_steps,
};
use rstest::rstest;
use support::FakeApi;

#[rstest]
#[case::sequential(false)]
#[case::parallel(true)]
fn reference_feature_passes(#[case] parallel: bool) {
    let features = GherkinFiles::new([support::reference_feature()])
        .load()
        .unwrap_or_else(|e| panic!("reference feature should load: {e}"));
    let api = Arc::new(FakeApi::default());
    let registry = support::registry();
    let hooks = api_steps::hooks();
    let options = RunnerOptions {
        parallel,
        ..RunnerOptions::default()
    };
    let runner = FeatureRunner::new(&registry, &hooks, support::world_factory(api.clone()))
        .with_options(options);
    let collector = Collector::new();

    let summary = runner.run_all(&features, &collector);

    assert_eq!(summary.to_string(), "3 scenarios (3 passed, 0 failed, 0 skipped)");
    assert!(summary.is_success());
    let names: Vec<String> = collector
        .snapshot()
        .iter()
        .map(|record| record.scenario_name().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "Successfully retrieve comics data with valid API key",
            "Successfully retrieve characters data with valid API key",
            "Fail to retrieve comics with invalid API key",
        ]
    );
    let mut paths = api.requests();
    paths.sort();
    assert_eq!(
        paths,
        ["/v1/public/characters", "/v1/public/comics", "/v1/public/comics"]
    );
    assert!(registry.unused().is_empty());
}

#[test]
fn invalid_credentials_do_not_leak_into_later_scenarios() {
    let text = "\
Feature: credential isolation
  Scenario: forged
    Given I have invalid Marvel API credentials
    When I send a GET request to \"comics\" endpoint
    Then I receive a 401 status code

  Scenario: genuine
    Given I have valid Marvel API credentials
    When I send a GET request to \"comics\" endpoint
    Then I receive a 200 status code
";
    let feature = parse_feature(Path::new("isolation.feature"), text)
        .unwrap_or_else(|e| panic!("feature should parse: {e}"));
    let api = Arc::new(FakeApi::default());
    let registry = support::registry();
    let hooks = api_steps::hooks();
    let runner = FeatureRunner::new(&registry, &hooks, support::world_factory(api));

    let result = runner.run_feature(&feature, &Collector::new());

    assert_eq!(result.passed(), 2);
}

#[test]
fn wrong_status_fails_fast_and_marks_remaining_steps() {
    let text = "\
Feature: failures
  Scenario: expects success with forged keys
    Given I have invalid Marvel API credentials
    When I send a GET request to \"comics\" endpoint
    Then I receive a 200 status code
    And the response contains \"comics\" data
";
    let feature = parse_feature(Path::new("failures.feature"), text)
        .unwrap_or_else(|e| panic!("feature should parse: {e}"));
    let registry = support::registry();
    let hooks = api_steps::hooks();
    let runner = FeatureRunner::new(
        &registry,
        &hooks,
        support::world_factory(Arc::new(FakeApi::default())),
    );

    let result = runner.run_feature(&feature, &Collector::new());

    let Some(scenario) = result.scenarios.first() else {
        panic!("one scenario result expected");
    };
    let Some(failure) = scenario.failure() else {
        panic!("scenario should fail: {:?}", scenario.status);
    };
    assert_eq!(failure.index, 2);
    assert_eq!(failure.message, "expected status code 200, but got 401");
    let outcomes: Vec<&StepOutcome> = scenario.steps.iter().map(|step| &step.outcome).collect();
    assert!(matches!(
        outcomes.as_slice(),
        [
            StepOutcome::Passed,
            StepOutcome::Passed,
            StepOutcome::Failed { .. },
            StepOutcome::NotRun
        ]
    ));
}

#[test]
fn ignored_scenario_sends_no_request() {
    let text = "\
Feature: skipping
  @ignore
  Scenario: not yet
    Given I have valid Marvel API credentials
    When I send a GET request to \"comics\" endpoint
";
    let feature = parse_feature(Path::new("skipping.feature"), text)
        .unwrap_or_else(|e| panic!("feature should parse: {e}"));
    let api = Arc::new(FakeApi::default());
    let registry = support::registry();
    let hooks = api_steps::hooks();
    let runner = FeatureRunner::new(&registry, &hooks, support::world_factory(api.clone()));

    let result = runner.run_feature(&feature, &Collector::new());

    assert_eq!(result.skipped(), 1);
    assert!(api.requests().is_empty());
    assert!(matches!(
        result.scenarios.first().map(|s| &s.status),
        Some(ScenarioStatus::Skipped(_))
    ));
}

#[test]
fn check_before_request_reports_missing_response() {
    let text = "\
Feature: ordering
  Scenario: premature check
    Then I receive a 200 status code
";
    let feature = parse_feature(Path::new("ordering.feature"), text)
        .unwrap_or_else(|e| panic!("feature should parse: {e}"));
    let registry = support::registry();
    let hooks = api_steps::hooks();
    let runner = FeatureRunner::new(
        &registry,
        &hooks,
        support::world_factory(Arc::new(FakeApi::default())),
    );

    let result = runner.run_feature(&feature, &Collector::new());

    let message = result
        .scenarios
        .first()
        .and_then(|s| s.failure())
        .map(|f| f.message.clone());
    assert_eq!(
        message.as_deref(),
        Some("no stored response: send a request before checking it")
    );
}

#[test]
fn undefined_step_is_reported_by_the_registry() {
    let registry = support::registry();
    let err = registry
        .resolve(StepKeyword::When, "I send a POST request to \"comics\" endpoint")
        .err();
    assert!(matches!(err, Some(ResolveError::Undefined { .. })));
}

#[test]
fn overlapping_binding_makes_step_ambiguous() {
    let mut registry = support::registry();
    registry
        .register(
            StepKeyword::Then,
            "I receive a {code} status code",
            |_, _| Ok(()),
        )
        .unwrap_or_else(|e| panic!("overlapping pattern is still distinct: {e}"));
    let Err(ResolveError::Ambiguous { patterns, .. }) =
        registry.resolve(StepKeyword::Then, "I receive a 200 status code")
    else {
        panic!("two patterns should match");
    };
    assert_eq!(
        patterns,
        [
            "I receive a {code} status code",
            "I receive a {status:u16} status code"
        ]
    );
    let failure: StepFailure = ResolveError::Ambiguous {
        keyword: StepKeyword::Then,
        text: "x".into(),
        patterns,
    }
    .into();
    assert!(failure.to_string().starts_with("ambiguous step"));
}
