//! Unit tests for the scenario state machine.

use std::sync::{Arc, Mutex, PoisonError};

use super::*;
use rstest::{fixture, rstest};

type Journal = Arc<Mutex<Vec<String>>>;

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

#[fixture]
fn registry() -> StepRegistry<Vec<String>> {
    let mut registry = StepRegistry::new();
    let steps: [(StepKeyword, &str, fn(&mut Vec<String>, &crate::StepArgs) -> Result<(), StepFailure>); 4] = [
        (StepKeyword::Given, "a step named {name}", |world, args| {
            world.push(args.get(0)?.to_string());
            Ok(())
        }),
        (StepKeyword::When, "a step fails", |_, _| {
            Err(StepFailure::assertion("expected 1, got 2"))
        }),
        (StepKeyword::Then, "a step panics", |_, _| panic!("handler exploded")),
        (StepKeyword::Then, "the world holds {count:usize} entries", |world, args| {
            let expected: usize = args.parse(0)?;
            if world.len() == expected {
                Ok(())
            } else {
                Err(StepFailure::assertion(format!(
                    "expected {expected} entries, got {}",
                    world.len()
                )))
            }
        }),
    ];
    for (keyword, pattern, handler) in steps {
        registry
            .register(keyword, pattern, handler)
            .unwrap_or_else(|e| panic!("valid pattern: {e}"));
    }
    registry
}

fn feature_with(scenario: Scenario) -> Feature {
    Feature::new("engine", "features/engine.feature", vec![scenario])
}

fn run(registry: &StepRegistry<Vec<String>>, hooks: &Hooks<Vec<String>>, steps: Vec<Step>) -> ScenarioResult {
    let scenario = Scenario::new("scenario", steps);
    let feature = feature_with(scenario.clone());
    ScenarioExecutor::new(registry, hooks).run(&feature, &scenario, Vec::new)
}

#[rstest]
fn all_steps_passing_yields_passed(registry: StepRegistry<Vec<String>>) {
    let result = run(
        &registry,
        &Hooks::new(),
        vec![
            Step::new(StepKeyword::Given, "a step named first"),
            Step::new(StepKeyword::And, "a step named second"),
            Step::new(StepKeyword::Then, "the world holds 2 entries"),
        ],
    );
    assert_eq!(result.status, ScenarioStatus::Passed);
    assert!(result.steps.iter().all(|s| s.outcome == StepOutcome::Passed));
}

#[rstest]
fn failure_stops_remaining_steps(registry: StepRegistry<Vec<String>>) {
    let result = run(
        &registry,
        &Hooks::new(),
        vec![
            Step::new(StepKeyword::Given, "a step named first"),
            Step::new(StepKeyword::When, "a step fails"),
            Step::new(StepKeyword::Then, "the world holds 1 entries"),
            Step::new(StepKeyword::And, "a step panics"),
        ],
    );
    let Some(failure) = result.failure() else {
        panic!("scenario should fail, got {:?}", result.status);
    };
    assert_eq!(failure.index, 1);
    assert_eq!(failure.keyword, Some(StepKeyword::When));
    assert_eq!(failure.message, "expected 1, got 2");
    let outcomes: Vec<&str> = result.steps.iter().map(|s| s.outcome.label()).collect();
    assert_eq!(outcomes, ["passed", "failed", "not run", "not run"]);
}

#[rstest]
fn conjunction_inherits_previous_keyword(registry: StepRegistry<Vec<String>>) {
    let result = run(
        &registry,
        &Hooks::new(),
        vec![
            Step::new(StepKeyword::Given, "a step named first"),
            Step::new(StepKeyword::Then, "the world holds 1 entries"),
            Step::new(StepKeyword::And, "a step named second"),
        ],
    );
    let Some(failure) = result.failure() else {
        panic!("And after Then must resolve as Then");
    };
    assert_eq!(failure.index, 2);
    assert_eq!(failure.message, "undefined step: Then a step named second");
}

#[rstest]
fn leading_conjunction_resolves_as_given(registry: StepRegistry<Vec<String>>) {
    let result = run(
        &registry,
        &Hooks::new(),
        vec![Step::new(StepKeyword::But, "a step named only")],
    );
    assert!(result.is_passed());
}

#[rstest]
fn handler_panic_becomes_failure_and_teardown_runs(registry: StepRegistry<Vec<String>>) {
    let journal: Journal = Arc::default();
    let seen = Arc::clone(&journal);
    let hooks = Hooks::new().after_scenario(move |_: &mut Vec<String>, _, state| {
        seen.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{state:?}"));
    });
    let result = run(
        &registry,
        &hooks,
        vec![Step::new(StepKeyword::Then, "a step panics")],
    );
    let Some(failure) = result.failure() else {
        panic!("a panicking handler must fail the scenario");
    };
    assert_eq!(failure.message, "step panicked: handler exploded");
    assert_eq!(entries(&journal), ["Failed"]);
}

#[rstest]
fn teardown_sees_world_after_steps(registry: StepRegistry<Vec<String>>) {
    let journal: Journal = Arc::default();
    let seen = Arc::clone(&journal);
    let hooks = Hooks::new()
        .before_scenario(|world: &mut Vec<String>, scenario| world.push(format!("setup {}", scenario.name)))
        .after_scenario(move |world, _, state| {
            let mut log = seen.lock().unwrap_or_else(PoisonError::into_inner);
            log.extend(world.drain(..));
            log.push(format!("{state:?}"));
        });
    let result = run(
        &registry,
        &hooks,
        vec![Step::new(StepKeyword::Given, "a step named body")],
    );
    assert!(result.is_passed());
    assert_eq!(entries(&journal), ["setup scenario", "body", "Passed"]);
}

#[rstest]
fn teardown_panic_fails_a_passing_scenario(registry: StepRegistry<Vec<String>>) {
    let hooks = Hooks::new().after_scenario(|_: &mut Vec<String>, _, _| panic!("cleanup failed"));
    let result = run(
        &registry,
        &hooks,
        vec![Step::new(StepKeyword::Given, "a step named body")],
    );
    assert_eq!(
        result.failure().map(ToString::to_string).as_deref(),
        Some("after_scenario hook failed: cleanup failed")
    );
}

#[rstest]
fn teardown_panic_keeps_original_failure(registry: StepRegistry<Vec<String>>) {
    let hooks = Hooks::new().after_scenario(|_: &mut Vec<String>, _, _| panic!("cleanup failed"));
    let result = run(&registry, &hooks, vec![Step::new(StepKeyword::When, "a step fails")]);
    assert_eq!(result.failure().map(|f| f.index), Some(0));
}

#[rstest]
fn before_scenario_panic_skips_every_step(registry: StepRegistry<Vec<String>>) {
    let hooks = Hooks::new().before_scenario(|_: &mut Vec<String>, _| panic!("no fixtures"));
    let result = run(
        &registry,
        &hooks,
        vec![Step::new(StepKeyword::Given, "a step named body")],
    );
    assert_eq!(
        result.failure().map(|f| f.text.as_str()),
        Some("before_scenario hook")
    );
    assert_eq!(result.steps.first().map(|s| &s.outcome), Some(&StepOutcome::NotRun));
}

#[rstest]
#[case::scenario_tag(Vec::new(), vec!["@ignore"])]
#[case::feature_tag(vec!["@ignore"], Vec::new())]
#[case::mixed_case(Vec::new(), vec!["@Ignore"])]
fn ignore_tag_skips_without_building_a_world(
    registry: StepRegistry<Vec<String>>,
    #[case] feature_tags: Vec<&str>,
    #[case] scenario_tags: Vec<&str>,
) {
    let scenario = Scenario::new(
        "skipped",
        vec![Step::new(StepKeyword::Then, "a step panics")],
    )
    .with_tags(scenario_tags);
    let feature = feature_with(scenario.clone()).with_tags(feature_tags);
    let hooks = Hooks::new().after_scenario(|_: &mut Vec<String>, _, _| panic!("teardown must not run"));
    let result = ScenarioExecutor::new(&registry, &hooks).run(&feature, &scenario, || {
        panic!("world must not be built for a skipped scenario")
    });
    let ScenarioStatus::Skipped(skip) = &result.status else {
        panic!("expected a skip, got {:?}", result.status);
    };
    assert!(!skip.forced_failure());
    assert_eq!(result.steps.first().map(|s| &s.outcome), Some(&StepOutcome::NotRun));
}

#[rstest]
fn custom_skip_tags_and_forced_failure(registry: StepRegistry<Vec<String>>) {
    let options = RunnerOptions {
        skip_tags: vec!["@wip".into()],
        fail_on_skipped: true,
        ..RunnerOptions::default()
    };
    let hooks = Hooks::new();
    let executor = ScenarioExecutor::new(&registry, &hooks).with_options(&options);

    let wip = Scenario::new("wip", Vec::new()).with_tags(["wip"]);
    let result = executor.run(&feature_with(wip.clone()), &wip, Vec::new);
    assert!(matches!(&result.status, ScenarioStatus::Skipped(skip) if skip.forced_failure()));

    let ignored = Scenario::new("ignored", Vec::new()).with_tags(["ignore"]);
    let result = executor.run(&feature_with(ignored.clone()), &ignored, Vec::new);
    assert!(result.is_passed(), "only configured tags skip");
}

#[test]
fn transitions_only_move_forward() {
    use ScenarioState::{Failed, Passed, Pending, Running, Skipped};
    let all = [Pending, Running, Passed, Failed, Skipped];
    let legal: Vec<(ScenarioState, ScenarioState)> = all
        .iter()
        .flat_map(|from| all.iter().map(move |to| (*from, *to)))
        .filter(|(from, to)| from.can_transition_to(*to))
        .collect();
    assert_eq!(
        legal,
        [
            (Pending, Running),
            (Pending, Skipped),
            (Running, Passed),
            (Running, Failed),
        ]
    );
    assert_eq!(all.iter().filter(|s| s.is_terminal()).count(), 3);
}
