//! Settings and runtime options.
//!
//! API settings come from a JSON file with an `ApiSettings` object and from
//! `APIBDD_*` environment variables, which take precedence. Environment
//! access is injected as a lookup function so callers decide where values
//! come from.
//!
//! ```json
//! {
//!   "ApiSettings": {
//!     "BaseUrl": "https://gateway.marvel.com/v1/public/",
//!     "PublicKey": "...",
//!     "PrivateKey": "..."
//!   }
//! }
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::request::Credentials;
use crate::tags::{IGNORE_TAG, extend_tag_set};

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "APIBDD_BASE_URL";
/// Environment variable overriding the public key.
pub const PUBLIC_KEY_ENV: &str = "APIBDD_PUBLIC_KEY";
/// Environment variable overriding the private key.
pub const PRIVATE_KEY_ENV: &str = "APIBDD_PRIVATE_KEY";
/// Environment variable turning skipped scenarios into failures.
pub const FAIL_ON_SKIPPED_ENV: &str = "APIBDD_FAIL_ON_SKIPPED";

/// Settings could not be assembled. Fatal before any scenario runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is absent or blank everywhere.
    #[error("missing configuration value {key} (set it in the settings file or {env})")]
    Missing {
        /// Settings-file key.
        key: &'static str,
        /// Overriding environment variable.
        env: &'static str,
    },
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// I/O error.
        source: io::Error,
    },
    /// The settings file is not valid JSON of the expected shape.
    #[error("failed to parse settings file {}: {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser error.
        source: serde_json::Error,
    },
    /// The base URL does not parse.
    #[error("invalid base URL '{value}': {source}")]
    InvalidUrl {
        /// Configured value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// A value has the wrong form.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// Key or variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsFile {
    #[serde(default)]
    api_settings: ApiSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiSection {
    base_url: Option<String>,
    public_key: Option<String>,
    private_key: Option<String>,
}

fn read_file(path: &Path) -> Result<ApiSection, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file not found, using environment only");
            return Ok(ApiSection::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let parsed: SettingsFile =
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parsed.api_settings)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(
    env: &impl Fn(&str) -> Option<String>,
    env_key: &'static str,
    file_value: Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    non_blank(env(env_key))
        .or_else(|| non_blank(file_value))
        .ok_or(ConfigError::Missing { key, env: env_key })
}

/// Base URL and key pair for the API under test.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absolute base URL.
    pub base_url: Url,
    /// Public key.
    pub public_key: String,
    /// Private key.
    pub private_key: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url.as_str())
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Settings {
    /// Load settings from `path` (if given) overlaid with `env`.
    ///
    /// A missing file is treated as empty; blank values count as absent.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a value is missing, the file is
    /// unreadable or malformed, or the base URL is not an absolute URL.
    ///
    /// # Examples
    /// ```
    /// use apibdd::Settings;
    ///
    /// let settings = Settings::load(None, |key| match key {
    ///     "APIBDD_BASE_URL" => Some("https://gateway.example/v1/public/".into()),
    ///     "APIBDD_PUBLIC_KEY" => Some("public".into()),
    ///     "APIBDD_PRIVATE_KEY" => Some("private".into()),
    ///     _ => None,
    /// })
    /// .expect("all values supplied");
    /// assert_eq!(settings.public_key, "public");
    /// ```
    pub fn load(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => read_file(path)?,
            None => ApiSection::default(),
        };
        let base_url = require(&env, BASE_URL_ENV, file.base_url, "ApiSettings:BaseUrl")?;
        let public_key = require(&env, PUBLIC_KEY_ENV, file.public_key, "ApiSettings:PublicKey")?;
        let private_key =
            require(&env, PRIVATE_KEY_ENV, file.private_key, "ApiSettings:PrivateKey")?;

        let parsed = Url::parse(base_url.trim()).map_err(|source| ConfigError::InvalidUrl {
            value: base_url.clone(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                key: "ApiSettings:BaseUrl",
                value: base_url,
            });
        }
        Ok(Self {
            base_url: parsed,
            public_key,
            private_key,
        })
    }

    /// Credentials for a new scenario.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            base_url: self.base_url.clone(),
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
        }
    }
}

/// Interpret common truthy and falsy spellings.
///
/// # Examples
/// ```
/// use apibdd::settings::parse_env_bool;
///
/// assert_eq!(parse_env_bool(" yes "), Some(true));
/// assert_eq!(parse_env_bool("Off"), Some(false));
/// assert_eq!(parse_env_bool("maybe"), None);
/// ```
#[must_use]
pub fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "Yes" | "on" | "ON" | "On" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off" => {
            Some(false)
        }
        _ => None,
    }
}

/// How the runner treats tags and scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Tags that skip a scenario, in `@tag` form.
    pub skip_tags: Vec<String>,
    /// Run the scenarios of a feature on scoped threads.
    pub parallel: bool,
    /// Count skipped scenarios as run failures.
    pub fail_on_skipped: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            skip_tags: vec![IGNORE_TAG.to_string()],
            parallel: false,
            fail_on_skipped: false,
        }
    }
}

impl RunnerOptions {
    /// Defaults with `fail_on_skipped` read from `APIBDD_FAIL_ON_SKIPPED`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] when the variable is set to
    /// something that is neither truthy nor falsy.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(raw) = env(FAIL_ON_SKIPPED_ENV) {
            options.fail_on_skipped =
                parse_env_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: FAIL_ON_SKIPPED_ENV,
                    value: raw.clone(),
                })?;
        }
        Ok(options)
    }

    /// Add skip tags, normalised and de-duplicated.
    #[must_use]
    pub fn with_skip_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let additions: Vec<String> = tags.into_iter().map(Into::into).collect();
        extend_tag_set(&mut self.skip_tags, &additions);
        self
    }
}
