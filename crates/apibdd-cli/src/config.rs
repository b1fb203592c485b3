//! Runner configuration parsed from environment variables.
//!
//! Settings can be overridden via environment variables prefixed with
//! `APIBDD_`; command line flags take precedence over both.

use std::str::FromStr;
use std::time::Duration;

use apibdd::transport::DEFAULT_TIMEOUT;

use crate::error::CliError;

/// Environment variable selecting the log level.
pub const LOG_LEVEL_ENV: &str = "APIBDD_LOG_LEVEL";
/// Environment variable selecting the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "APIBDD_TIMEOUT_SECS";

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including request URLs and step resolution.
    Trace,
    /// Request URLs and step resolution.
    Debug,
    /// Feature and scenario outcomes.
    #[default]
    Info,
    /// Skipped scenarios.
    Warn,
    /// Failed scenarios.
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(CliError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Configuration for the runner process.
///
/// # Environment Variables
///
/// - `APIBDD_LOG_LEVEL`: log level (trace, debug, info, warn, error)
/// - `APIBDD_TIMEOUT_SECS`: per-request timeout, a positive whole number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Bound on each HTTP request.
    pub timeout: Duration,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn timeout_from_secs(secs: u64, raw: &str) -> Result<Duration, CliError> {
    if secs == 0 {
        return Err(invalid_timeout(raw));
    }
    Ok(Duration::from_secs(secs))
}

fn invalid_timeout(raw: &str) -> CliError {
    CliError::InvalidConfig(format!(
        "invalid timeout '{raw}', expected a positive number of seconds"
    ))
}

impl CliConfig {
    /// Load configuration through `env`, falling back to defaults for
    /// missing values.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidConfig` if a variable contains an invalid
    /// value.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let mut config = Self::default();
        if let Some(raw) = env(LOG_LEVEL_ENV) {
            config.log_level = raw.parse()?;
        }
        if let Some(raw) = env(TIMEOUT_ENV) {
            let secs = raw.trim().parse().map_err(|_| invalid_timeout(&raw))?;
            config.timeout = timeout_from_secs(secs, &raw)?;
        }
        Ok(config)
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`CliConfig::from_env`].
    pub fn from_process_env() -> Result<Self, CliError> {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for CLI overrides that should take precedence over
    /// environment-based defaults.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidConfig` for a zero timeout.
    pub fn apply_overrides(
        mut self,
        log_level: Option<LogLevel>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, CliError> {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(secs) = timeout_secs {
            self.timeout = timeout_from_secs(secs, &secs.to_string())?;
        }
        Ok(self)
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}
