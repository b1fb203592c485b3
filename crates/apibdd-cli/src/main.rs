//! Runs Given/When/Then feature files against a signed HTTP API.

use std::path::PathBuf;
use std::process::ExitCode;

use apibdd_cli::app::{self, RunRequest};
use apibdd_cli::config::{CliConfig, LogLevel};
use apibdd_cli::error::CliError;
use apibdd_cli::logging::init_logging;
use clap::Parser;
use eyre::{Context, Result};
use tracing::{error, info};

/// Run feature files against a signed HTTP API.
#[derive(Parser, Debug)]
#[command(name = "apibdd", version, about)]
struct Args {
    /// Feature files or directories to run.
    #[arg(default_value = "features")]
    paths: Vec<PathBuf>,

    /// JSON settings file holding `ApiSettings`.
    #[arg(long, default_value = "config/appsettings.json")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Skip scenarios carrying this tag, in addition to `@ignore`.
    #[arg(long = "tags-skip", value_name = "TAG")]
    tags_skip: Vec<String>,

    /// Run the scenarios of each feature concurrently.
    #[arg(long)]
    parallel: bool,

    /// Fail the run when any scenario is skipped.
    #[arg(long)]
    fail_on_skipped: bool,

    /// Write a `JUnit` XML report to this path.
    #[arg(long, value_name = "PATH")]
    junit: Option<PathBuf>,

    /// Write a JSON report to this path.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Print the registered step patterns and exit.
    #[arg(long)]
    list_steps: bool,
}

impl Args {
    fn request(&self) -> RunRequest {
        RunRequest {
            paths: self.paths.clone(),
            settings_path: self.config.clone(),
            skip_tags: self.tags_skip.clone(),
            parallel: self.parallel,
            fail_on_skipped: self.fail_on_skipped,
            junit: self.junit.clone(),
            json: self.json.clone(),
        }
    }
}

fn build_config(args: &Args) -> Result<CliConfig, CliError> {
    CliConfig::from_process_env()?.apply_overrides(args.log_level, args.timeout)
}

fn list_steps() -> Result<()> {
    let registry = app::build_registry()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::list_steps(&registry, &mut out).wrap_err("failed to list steps")
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&CliConfig::default());
            error!(error = %e, "invalid configuration");
            return ExitCode::from(CliError::EXIT_CODE);
        }
    };
    init_logging(&config);

    if args.list_steps {
        return match list_steps() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %format!("{e:#}"), "step listing failed");
                ExitCode::from(CliError::EXIT_CODE)
            }
        };
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting apibdd");
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match app::run(&args.request(), &config, |key| std::env::var(key).ok(), &mut out) {
        Ok(summary) => ExitCode::from(app::exit_code(&summary)),
        Err(e) => {
            error!(error = %format!("{e:#}"), "run aborted");
            ExitCode::from(CliError::EXIT_CODE)
        }
    }
}
