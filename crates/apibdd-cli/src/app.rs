//! Runner wiring: settings, feature files, step bindings and reports.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apibdd::api_steps::{self, ApiWorld};
use apibdd::reporting::{Collector, ScenarioRecord, json, junit};
use apibdd::{
    FeatureRunner, FeatureSource, GherkinFiles, LogSink, ReqwestTransport, RequestExecutor,
    RunSummary, RunnerOptions, Settings, StepRegistry, TransportOptions,
};
use eyre::{Context, Result};
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::error::CliError;

/// Exit code when every scenario passed.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when a scenario failed, or was skipped under `fail_on_skipped`.
pub const EXIT_FAILURE: u8 = 1;

/// What to run and where to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Feature files or directories.
    pub paths: Vec<PathBuf>,
    /// JSON settings file.
    pub settings_path: PathBuf,
    /// Tags skipped in addition to `@ignore`.
    pub skip_tags: Vec<String>,
    /// Run scenarios of a feature concurrently.
    pub parallel: bool,
    /// Treat skipped scenarios as failures.
    pub fail_on_skipped: bool,
    /// `JUnit` XML destination.
    pub junit: Option<PathBuf>,
    /// JSON report destination.
    pub json: Option<PathBuf>,
}

/// Registry holding the API step bindings.
///
/// # Errors
/// Returns [`CliError::Registry`] if the bindings collide.
pub fn build_registry() -> Result<StepRegistry<ApiWorld>, CliError> {
    let mut registry = StepRegistry::new();
    api_steps::register(&mut registry)?;
    Ok(registry)
}

/// Write every registered step as `Keyword pattern`, one per line.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn list_steps(registry: &StepRegistry<ApiWorld>, out: &mut dyn Write) -> Result<()> {
    for binding in registry.bindings() {
        writeln!(out, "{} {}", binding.keyword(), binding.pattern().as_str())
            .wrap_err("failed to write step listing")?;
    }
    Ok(())
}

/// Combine flags with `APIBDD_FAIL_ON_SKIPPED`.
///
/// # Errors
/// Returns [`CliError::Settings`] for an unparseable environment value.
pub fn runner_options(
    request: &RunRequest,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RunnerOptions, CliError> {
    let mut options = RunnerOptions::from_env(env)?.with_skip_tags(request.skip_tags.iter().cloned());
    options.parallel = request.parallel;
    options.fail_on_skipped |= request.fail_on_skipped;
    Ok(options)
}

/// Load everything, run every feature and write the requested reports.
///
/// Settings and feature files are loaded before the first scenario runs,
/// so configuration problems surface as errors rather than failures.
///
/// # Errors
/// Returns an error for configuration, feature-file or report problems.
/// Failed scenarios are not errors; inspect the returned summary.
pub fn run(
    request: &RunRequest,
    config: &CliConfig,
    env: impl Fn(&str) -> Option<String>,
    out: &mut dyn Write,
) -> Result<RunSummary> {
    let settings = Settings::load(Some(request.settings_path.as_path()), &env)
        .map_err(CliError::from)
        .wrap_err_with(|| {
            format!(
                "failed to load settings from {}",
                request.settings_path.display()
            )
        })?;
    let options = runner_options(request, &env)?;
    let features = GherkinFiles::new(request.paths.iter().cloned())
        .load()
        .map_err(CliError::from)?;
    if features.is_empty() {
        warn!(paths = ?request.paths, "no feature files found");
    }

    let transport = ReqwestTransport::new(&TransportOptions::default().with_timeout(config.timeout))
        .map_err(CliError::from)?;
    let executor = RequestExecutor::new(Arc::new(transport));
    let credentials = settings.credentials();
    let registry = build_registry()?;
    let hooks = api_steps::hooks();
    let runner = FeatureRunner::new(&registry, &hooks, move || {
        ApiWorld::new(credentials.clone(), executor.clone())
    })
    .with_options(options);

    let collector = Collector::new();
    let summary = runner.run_all(&features, &(LogSink, &collector));
    for binding in registry.unused() {
        info!(keyword = %binding.keyword(), pattern = binding.pattern().as_str(), "step never used");
    }

    let records = collector.drain();
    if let Some(path) = &request.junit {
        write_junit(path, &records)?;
    }
    if let Some(path) = &request.json {
        write_json(path, &records)?;
    }
    writeln!(out, "{summary}").wrap_err("failed to write run summary")?;
    Ok(summary)
}

/// Process exit code for a finished run.
#[must_use]
pub fn exit_code(summary: &RunSummary) -> u8 {
    if summary.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

fn report_error(path: &Path, message: impl ToString) -> CliError {
    CliError::Report {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn write_junit(path: &Path, records: &[ScenarioRecord]) -> Result<(), CliError> {
    let mut document = String::new();
    junit::write(&mut document, records).map_err(|err| report_error(path, err))?;
    std::fs::write(path, document).map_err(|err| report_error(path, err))?;
    info!(path = %path.display(), "wrote JUnit report");
    Ok(())
}

fn write_json(path: &Path, records: &[ScenarioRecord]) -> Result<(), CliError> {
    let file = File::create(path).map_err(|err| report_error(path, err))?;
    let mut writer = BufWriter::new(file);
    json::write(&mut writer, records).map_err(|err| report_error(path, err))?;
    writer.flush().map_err(|err| report_error(path, err))?;
    info!(path = %path.display(), "wrote JSON report");
    Ok(())
}
