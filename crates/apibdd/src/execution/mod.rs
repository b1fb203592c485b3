//! Scenario execution.
//!
//! A [`ScenarioExecutor`] walks one scenario through
//! `Pending → Running → {Passed, Failed}` or `Pending → Skipped`. Steps run
//! strictly in order and the first failure stops the scenario; the
//! `after_scenario` hook runs on every exit from `Running`, including after a
//! handler panics.

mod panic;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use apibdd_patterns::StepKeyword;
use tracing::{debug, error, info};

use crate::failure::StepFailure;
use crate::model::{Feature, Scenario, Step};
use crate::registry::StepRegistry;
use crate::result::{
    FeatureResult, ScenarioResult, ScenarioStatus, SkippedScenario, StepFailureRecord,
    StepOutcome, StepReport,
};
use crate::settings::RunnerOptions;
use crate::tags::{IGNORE_TAG, find_skip_tag};

pub use panic::panic_message;

/// Lifecycle state of a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioState {
    /// Not started.
    Pending,
    /// Steps are executing.
    Running,
    /// Every step passed.
    Passed,
    /// A step or hook failed.
    Failed,
    /// A skip tag matched.
    Skipped,
}

impl ScenarioState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// # Examples
    /// ```
    /// use apibdd::ScenarioState;
    ///
    /// assert!(ScenarioState::Pending.can_transition_to(ScenarioState::Skipped));
    /// assert!(!ScenarioState::Skipped.can_transition_to(ScenarioState::Running));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Skipped)
                | (Self::Running, Self::Passed | Self::Failed)
        )
    }

    fn advance(&mut self, next: Self) {
        debug_assert!(
            self.can_transition_to(next),
            "illegal scenario transition {self:?} -> {next:?}"
        );
        *self = next;
    }
}

type FeatureHook = Box<dyn Fn(&Feature) + Send + Sync>;
type FeatureDoneHook = Box<dyn Fn(&Feature, &FeatureResult) + Send + Sync>;
type ScenarioHook<W> = Box<dyn Fn(&mut W, &Scenario) + Send + Sync>;
type TeardownHook<W> = Box<dyn Fn(&mut W, &Scenario, ScenarioState) + Send + Sync>;

/// Optional callbacks around features and scenarios.
pub struct Hooks<W> {
    before_feature: Option<FeatureHook>,
    after_feature: Option<FeatureDoneHook>,
    before_scenario: Option<ScenarioHook<W>>,
    after_scenario: Option<TeardownHook<W>>,
}

impl<W> Default for Hooks<W> {
    fn default() -> Self {
        Self {
            before_feature: None,
            after_feature: None,
            before_scenario: None,
            after_scenario: None,
        }
    }
}

impl<W> std::fmt::Debug for Hooks<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_feature", &self.before_feature.is_some())
            .field("after_feature", &self.after_feature.is_some())
            .field("before_scenario", &self.before_scenario.is_some())
            .field("after_scenario", &self.after_scenario.is_some())
            .finish()
    }
}

impl<W> Hooks<W> {
    /// No hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` once before the first scenario of each feature.
    #[must_use]
    pub fn before_feature(mut self, hook: impl Fn(&Feature) + Send + Sync + 'static) -> Self {
        self.before_feature = Some(Box::new(hook));
        self
    }

    /// Run `hook` once after the last scenario of each feature.
    #[must_use]
    pub fn after_feature(
        mut self,
        hook: impl Fn(&Feature, &FeatureResult) + Send + Sync + 'static,
    ) -> Self {
        self.after_feature = Some(Box::new(hook));
        self
    }

    /// Run `hook` on the fresh world before the first step.
    #[must_use]
    pub fn before_scenario(
        mut self,
        hook: impl Fn(&mut W, &Scenario) + Send + Sync + 'static,
    ) -> Self {
        self.before_scenario = Some(Box::new(hook));
        self
    }

    /// Run `hook` after the last step, whatever the outcome.
    #[must_use]
    pub fn after_scenario(
        mut self,
        hook: impl Fn(&mut W, &Scenario, ScenarioState) + Send + Sync + 'static,
    ) -> Self {
        self.after_scenario = Some(Box::new(hook));
        self
    }

    pub(crate) fn run_before_feature(&self, feature: &Feature) {
        if let Some(hook) = &self.before_feature {
            hook(feature);
        }
    }

    pub(crate) fn run_after_feature(&self, feature: &Feature, result: &FeatureResult) {
        if let Some(hook) = &self.after_feature {
            hook(feature, result);
        }
    }
}

pub(crate) fn guarded(name: &str, f: impl FnOnce()) -> Result<(), String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        error!(hook = name, panic = %message, "hook panicked");
        message
    })
}

fn not_run(step: &Step) -> StepReport {
    StepReport {
        keyword: step.keyword,
        text: step.text.clone(),
        outcome: StepOutcome::NotRun,
    }
}

/// Runs single scenarios against a registry.
pub struct ScenarioExecutor<'a, W> {
    registry: &'a StepRegistry<W>,
    hooks: &'a Hooks<W>,
    skip_tags: Vec<String>,
    fail_on_skipped: bool,
}

impl<W> std::fmt::Debug for ScenarioExecutor<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioExecutor")
            .field("skip_tags", &self.skip_tags)
            .field("fail_on_skipped", &self.fail_on_skipped)
            .finish_non_exhaustive()
    }
}

impl<'a, W> ScenarioExecutor<'a, W> {
    /// Executor that skips `@ignore` scenarios.
    #[must_use]
    pub fn new(registry: &'a StepRegistry<W>, hooks: &'a Hooks<W>) -> Self {
        Self {
            registry,
            hooks,
            skip_tags: vec![IGNORE_TAG.to_string()],
            fail_on_skipped: false,
        }
    }

    /// Take skip tags and skip policy from `options`.
    #[must_use]
    pub fn with_options(mut self, options: &RunnerOptions) -> Self {
        self.skip_tags.clone_from(&options.skip_tags);
        self.fail_on_skipped = options.fail_on_skipped;
        self
    }

    /// Run `scenario` of `feature`.
    ///
    /// `world` is only called when the scenario is not skipped. Every error
    /// and handler panic is captured in the returned result.
    pub fn run(
        &self,
        feature: &Feature,
        scenario: &Scenario,
        world: impl FnOnce() -> W,
    ) -> ScenarioResult {
        let started = Instant::now();
        let tags = feature.effective_tags(scenario);
        let (status, steps) = self.execute(feature, scenario, &tags, world);
        ScenarioResult {
            feature: feature.name.clone(),
            feature_path: feature.path.clone(),
            scenario: scenario.name.clone(),
            line: scenario.line,
            tags,
            status,
            steps,
            duration: started.elapsed(),
        }
    }

    fn execute(
        &self,
        feature: &Feature,
        scenario: &Scenario,
        tags: &[String],
        world: impl FnOnce() -> W,
    ) -> (ScenarioStatus, Vec<StepReport>) {
        let mut state = ScenarioState::Pending;
        if let Some(tag) = find_skip_tag(tags, &self.skip_tags) {
            state.advance(ScenarioState::Skipped);
            let skipped = SkippedScenario::new(tag, self.fail_on_skipped);
            let steps = scenario.steps.iter().map(not_run).collect();
            return (ScenarioStatus::Skipped(skipped), steps);
        }
        state.advance(ScenarioState::Running);
        info!(feature = %feature.name, scenario = %scenario.name, "running scenario");
        self.run_steps(scenario, world(), &mut state)
    }

    fn run_steps(
        &self,
        scenario: &Scenario,
        mut world: W,
        state: &mut ScenarioState,
    ) -> (ScenarioStatus, Vec<StepReport>) {
        let mut failure = self.hooks.before_scenario.as_ref().and_then(|hook| {
            guarded("before_scenario", || hook(&mut world, scenario))
                .err()
                .map(|message| StepFailureRecord::hook(0, "before_scenario", message))
        });

        let mut reports = Vec::with_capacity(scenario.steps.len());
        let mut previous = None;
        for (index, step) in scenario.steps.iter().enumerate() {
            if failure.is_some() {
                reports.push(not_run(step));
                continue;
            }
            let keyword = step.keyword.resolve(&mut previous);
            match self.run_step(&mut world, keyword, step) {
                Ok(()) => reports.push(StepReport {
                    keyword: step.keyword,
                    text: step.text.clone(),
                    outcome: StepOutcome::Passed,
                }),
                Err(err) => {
                    let message = err.to_string();
                    debug!(index, step = %step.text, %message, "step failed");
                    reports.push(StepReport {
                        keyword: step.keyword,
                        text: step.text.clone(),
                        outcome: StepOutcome::Failed {
                            message: message.clone(),
                        },
                    });
                    failure = Some(StepFailureRecord {
                        index,
                        keyword: Some(step.keyword),
                        text: step.text.clone(),
                        message,
                    });
                }
            }
        }

        let reached = if failure.is_some() {
            ScenarioState::Failed
        } else {
            ScenarioState::Passed
        };
        if let Some(hook) = &self.hooks.after_scenario {
            let teardown = guarded("after_scenario", || hook(&mut world, scenario, reached));
            if let Some(message) = teardown.err().filter(|_| failure.is_none()) {
                failure = Some(StepFailureRecord::hook(
                    scenario.steps.len(),
                    "after_scenario",
                    message,
                ));
            }
        }
        state.advance(if failure.is_some() {
            ScenarioState::Failed
        } else {
            ScenarioState::Passed
        });

        let status = failure.map_or(ScenarioStatus::Passed, ScenarioStatus::Failed);
        (status, reports)
    }

    fn run_step(&self, world: &mut W, keyword: StepKeyword, step: &Step) -> Result<(), StepFailure> {
        let resolved = self.registry.resolve(keyword, &step.text)?;
        match catch_unwind(AssertUnwindSafe(|| resolved.invoke(world))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(StepFailure::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

#[cfg(test)]
mod tests;
