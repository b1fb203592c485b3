//! Structured logging for the runner.
//!
//! Logs go to stderr so stdout carries only the summary line and step
//! listings.

use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

fn filter_from_config(config: &CliConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Initialise the logging subsystem based on configuration.
///
/// Log level precedence (highest to lowest):
///
/// 1. CLI `--log-level`
/// 2. `APIBDD_LOG_LEVEL`
/// 3. Default configuration value
///
/// If a global subscriber is already set the call does nothing, so the
/// first initialisation wins.
pub fn init_logging(config: &CliConfig) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
