//! Feature-level orchestration and result sinks.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::execution::{Hooks, ScenarioExecutor, guarded, panic_message};
use crate::model::{Feature, Scenario};
use crate::registry::StepRegistry;
use crate::result::{
    FeatureResult, RunSummary, ScenarioResult, ScenarioStatus, StepFailureRecord, StepOutcome,
    StepReport,
};
use crate::settings::RunnerOptions;

/// Receives outcomes as the run progresses.
///
/// Scenario results arrive in declaration order, followed by the result of
/// their feature.
pub trait ResultSink {
    /// Called once per scenario.
    fn on_scenario(&self, result: &ScenarioResult);

    /// Called once per feature after all its scenarios.
    fn on_feature(&self, _result: &FeatureResult) {}
}

impl<T: ResultSink + ?Sized> ResultSink for &T {
    fn on_scenario(&self, result: &ScenarioResult) {
        (**self).on_scenario(result);
    }

    fn on_feature(&self, result: &FeatureResult) {
        (**self).on_feature(result);
    }
}

impl<A: ResultSink, B: ResultSink> ResultSink for (A, B) {
    fn on_scenario(&self, result: &ScenarioResult) {
        self.0.on_scenario(result);
        self.1.on_scenario(result);
    }

    fn on_feature(&self, result: &FeatureResult) {
        self.0.on_feature(result);
        self.1.on_feature(result);
    }
}

/// Sink that reports outcomes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn on_scenario(&self, result: &ScenarioResult) {
        let elapsed_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX);
        match &result.status {
            ScenarioStatus::Passed => {
                info!(feature = %result.feature, scenario = %result.scenario, elapsed_ms, "scenario passed");
            }
            ScenarioStatus::Failed(failure) => {
                error!(
                    feature = %result.feature,
                    scenario = %result.scenario,
                    elapsed_ms,
                    %failure,
                    "scenario failed"
                );
            }
            ScenarioStatus::Skipped(skip) => {
                warn!(
                    feature = %result.feature,
                    scenario = %result.scenario,
                    tag = skip.tag(),
                    forced_failure = skip.forced_failure(),
                    "scenario skipped"
                );
            }
        }
    }

    fn on_feature(&self, result: &FeatureResult) {
        info!(
            feature = %result.name,
            passed = result.passed(),
            failed = result.failed(),
            skipped = result.skipped(),
            "feature finished"
        );
    }
}

type WorldFactory<'a, W> = Box<dyn Fn() -> W + Send + Sync + 'a>;

/// Runs whole features, one fresh world per scenario.
pub struct FeatureRunner<'a, W> {
    registry: &'a StepRegistry<W>,
    hooks: &'a Hooks<W>,
    options: RunnerOptions,
    world: WorldFactory<'a, W>,
}

impl<W> std::fmt::Debug for FeatureRunner<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRunner")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a, W> FeatureRunner<'a, W> {
    /// Runner with default options.
    #[must_use]
    pub fn new(
        registry: &'a StepRegistry<W>,
        hooks: &'a Hooks<W>,
        world: impl Fn() -> W + Send + Sync + 'a,
    ) -> Self {
        Self {
            registry,
            hooks,
            options: RunnerOptions::default(),
            world: Box::new(world),
        }
    }

    /// Replace the runner options.
    #[must_use]
    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every feature in order.
    pub fn run_all(&self, features: &[Feature], sink: &dyn ResultSink) -> RunSummary {
        RunSummary {
            features: features
                .iter()
                .map(|feature| self.run_feature(feature, sink))
                .collect(),
        }
    }

    /// Run one feature: setup hook, every scenario, teardown hook.
    ///
    /// A failing scenario never stops the feature.
    pub fn run_feature(&self, feature: &Feature, sink: &dyn ResultSink) -> FeatureResult {
        info!(
            feature = %feature.name,
            path = %feature.path,
            scenarios = feature.scenarios.len(),
            parallel = self.options.parallel,
            "running feature"
        );
        let setup = guarded("before_feature", || self.hooks.run_before_feature(feature));
        let scenarios = match setup {
            Ok(()) if self.options.parallel => self.run_parallel(feature),
            Ok(()) => self.run_sequential(feature),
            Err(message) => feature
                .scenarios
                .iter()
                .map(|scenario| {
                    let record = StepFailureRecord::hook(0, "before_feature", message.clone());
                    aborted(feature, scenario, record)
                })
                .collect(),
        };
        for result in &scenarios {
            sink.on_scenario(result);
        }

        let result = FeatureResult {
            name: feature.name.clone(),
            path: feature.path.clone(),
            scenarios,
        };
        // Teardown failures are logged by the guard; every scenario result is final.
        let _ = guarded("after_feature", || {
            self.hooks.run_after_feature(feature, &result);
        });
        sink.on_feature(&result);
        result
    }

    fn executor(&self) -> ScenarioExecutor<'_, W> {
        ScenarioExecutor::new(self.registry, self.hooks).with_options(&self.options)
    }

    fn run_sequential(&self, feature: &Feature) -> Vec<ScenarioResult> {
        let executor = self.executor();
        feature
            .scenarios
            .iter()
            .map(|scenario| self.run_isolated(&executor, feature, scenario))
            .collect()
    }

    fn run_parallel(&self, feature: &Feature) -> Vec<ScenarioResult> {
        let executor = self.executor();
        std::thread::scope(|scope| {
            let handles: Vec<_> = feature
                .scenarios
                .iter()
                .map(|scenario| {
                    let executor = &executor;
                    scope.spawn(move || self.run_isolated(executor, feature, scenario))
                })
                .collect();
            handles
                .into_iter()
                .zip(&feature.scenarios)
                .map(|(handle, scenario)| {
                    handle.join().unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        aborted(feature, scenario, world_failure(message))
                    })
                })
                .collect()
        })
    }

    fn run_isolated(
        &self,
        executor: &ScenarioExecutor<'_, W>,
        feature: &Feature,
        scenario: &Scenario,
    ) -> ScenarioResult {
        catch_unwind(AssertUnwindSafe(|| {
            executor.run(feature, scenario, || (self.world)())
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(scenario = %scenario.name, panic = %message, "scenario setup panicked");
            aborted(feature, scenario, world_failure(message))
        })
    }
}

fn world_failure(message: String) -> StepFailureRecord {
    StepFailureRecord {
        index: 0,
        keyword: None,
        text: "world setup".into(),
        message,
    }
}

fn aborted(feature: &Feature, scenario: &Scenario, record: StepFailureRecord) -> ScenarioResult {
    ScenarioResult {
        feature: feature.name.clone(),
        feature_path: feature.path.clone(),
        scenario: scenario.name.clone(),
        line: scenario.line,
        tags: feature.effective_tags(scenario),
        status: ScenarioStatus::Failed(record),
        steps: scenario
            .steps
            .iter()
            .map(|step| StepReport {
                keyword: step.keyword,
                text: step.text.clone(),
                outcome: StepOutcome::NotRun,
            })
            .collect(),
        duration: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::*;
    use crate::StepKeyword;
    use crate::model::Step;
    use rstest::{fixture, rstest};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl ResultSink for Recorder {
        fn on_scenario(&self, result: &ScenarioResult) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{}:{}", result.scenario, result.status.label()));
        }

        fn on_feature(&self, result: &FeatureResult) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("feature:{}", result.name));
        }
    }

    #[fixture]
    fn registry() -> StepRegistry<u32> {
        let mut registry = StepRegistry::new();
        registry
            .register(StepKeyword::Given, "the counter is {n:u32}", |world: &mut u32, args| {
                *world = args.parse(0)?;
                Ok(())
            })
            .unwrap_or_else(|e| panic!("valid pattern: {e}"));
        registry
            .register(StepKeyword::Then, "the counter is {n:u32}", |world: &mut u32, args| {
                let expected: u32 = args.parse(0)?;
                if *world == expected {
                    Ok(())
                } else {
                    Err(crate::StepFailure::assertion(format!(
                        "expected counter {expected}, got {world}"
                    )))
                }
            })
            .unwrap_or_else(|e| panic!("valid pattern: {e}"));
        registry
    }

    fn scenario(name: &str, set: u32, check: u32) -> Scenario {
        Scenario::new(
            name,
            vec![
                Step::new(StepKeyword::Given, format!("the counter is {set}")),
                Step::new(StepKeyword::Then, format!("the counter is {check}")),
            ],
        )
    }

    fn feature() -> Feature {
        Feature::new(
            "counter",
            "features/counter.feature",
            vec![
                scenario("first", 1, 1),
                scenario("second", 2, 3),
                scenario("third", 3, 3).with_tags(["@ignore"]),
                scenario("fourth", 4, 4),
            ],
        )
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::parallel(true)]
    fn failures_do_not_stop_the_feature(registry: StepRegistry<u32>, #[case] parallel: bool) {
        let hooks = Hooks::new();
        let runner = FeatureRunner::new(&registry, &hooks, || 0).with_options(RunnerOptions {
            parallel,
            ..RunnerOptions::default()
        });
        let recorder = Recorder::default();
        let result = runner.run_feature(&feature(), &recorder);
        assert_eq!((result.passed(), result.failed(), result.skipped()), (2, 1, 1));
        assert_eq!(
            recorder.events(),
            [
                "first:passed",
                "second:failed",
                "third:skipped",
                "fourth:passed",
                "feature:counter"
            ]
        );
    }

    #[derive(Default)]
    struct ScenarioCounter(Mutex<usize>);

    impl ResultSink for ScenarioCounter {
        fn on_scenario(&self, _result: &ScenarioResult) {
            *self.0.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        }
    }

    #[rstest]
    fn sinks_may_ignore_feature_results(registry: StepRegistry<u32>) {
        let hooks = Hooks::new();
        let runner = FeatureRunner::new(&registry, &hooks, || 0);
        let counter = ScenarioCounter::default();
        let result = runner.run_feature(&feature(), &counter);
        assert_eq!(result.scenarios.len(), 4);
        assert_eq!(*counter.0.lock().unwrap_or_else(PoisonError::into_inner), 4);
    }

    #[rstest]
    fn feature_hooks_wrap_every_scenario(registry: StepRegistry<u32>) {
        let journal: Arc<Mutex<Vec<String>>> = Arc::default();
        let (before, after, each) = (Arc::clone(&journal), Arc::clone(&journal), Arc::clone(&journal));
        let hooks = Hooks::<u32>::new()
            .before_feature(move |feature| {
                before
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("setup {}", feature.name));
            })
            .after_scenario(move |_, scenario, _| {
                each.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(scenario.name.clone());
            })
            .after_feature(move |_, result| {
                after
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("teardown {}", result.scenarios.len()));
            });
        let runner = FeatureRunner::new(&registry, &hooks, || 0);
        let _ = runner.run_feature(&feature(), &LogSink);
        let entries = journal.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(
            entries,
            ["setup counter", "first", "second", "fourth", "teardown 4"]
        );
    }

    #[rstest]
    fn before_feature_panic_fails_every_scenario(registry: StepRegistry<u32>) {
        let hooks = Hooks::<u32>::new().before_feature(|_| panic!("no server"));
        let runner = FeatureRunner::new(&registry, &hooks, || 0);
        let result = runner.run_feature(&feature(), &LogSink);
        assert_eq!(result.failed(), 4);
        assert_eq!(
            result.scenarios.first().and_then(ScenarioResult::failure).map(ToString::to_string),
            Some("before_feature hook failed: no server".to_string())
        );
    }

    #[rstest]
    fn world_factory_panic_is_contained(registry: StepRegistry<u32>) {
        let hooks = Hooks::new();
        let runner = FeatureRunner::new(&registry, &hooks, || -> u32 { panic!("no world") });
        let result = runner.run_feature(&feature(), &LogSink);
        assert_eq!((result.failed(), result.skipped()), (3, 1));
    }

    #[rstest]
    fn run_all_aggregates_and_fans_out(registry: StepRegistry<u32>) {
        let hooks = Hooks::new();
        let runner = FeatureRunner::new(&registry, &hooks, || 0);
        let recorder = Recorder::default();
        let summary = runner.run_all(&[feature(), feature()], &(LogSink, &recorder));
        assert_eq!(summary.total(), 8);
        assert_eq!(summary.to_string(), "8 scenarios (4 passed, 2 failed, 2 skipped)");
        assert!(!summary.is_success());
        assert_eq!(recorder.events().len(), 10);
    }
}
