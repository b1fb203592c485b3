//! HTTP transport seam.
//!
//! The engine issues exactly one kind of call, a GET with query parameters,
//! so the [`Transport`] trait is that call and nothing more. The production
//! implementation wraps a blocking `reqwest` client with a single bounded
//! timeout and no retries.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body decoded as text.
    pub body: String,
}

/// Failures raised before a status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived within the configured timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Request URL without query parameters.
        url: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
    /// The connection could not be established.
    #[error("failed to connect to {url}: {reason}")]
    Connect {
        /// Request URL without query parameters.
        url: String,
        /// Underlying error text.
        reason: String,
    },
    /// Any other request failure, including body decoding.
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Request URL without query parameters.
        url: String,
        /// Underlying error text.
        reason: String,
    },
    /// The endpoint could not be joined onto the base URL.
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        /// Endpoint as written in the step.
        endpoint: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Issues signed GET requests.
pub trait Transport: Send + Sync {
    /// Send a GET to `url` with `query` appended in order.
    ///
    /// # Errors
    /// Returns [`TransportError`] when no HTTP status was obtained. Error
    /// statuses such as `401` are successful transports.
    fn get(&self, url: &Url, query: &[(&str, &str)]) -> Result<RawResponse, TransportError>;
}

/// Settings for [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("apibdd/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportOptions {
    /// Replace the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a client from `options`.
    ///
    /// Must not be called from inside an async runtime, as the blocking
    /// client owns one of its own.
    ///
    /// # Errors
    /// Returns [`TransportError::Client`] when the TLS backend or client
    /// configuration cannot be initialised.
    pub fn new(options: &TransportOptions) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self {
            client,
            timeout: options.timeout,
        })
    }

    fn classify(&self, url: &Url, err: reqwest::Error) -> TransportError {
        let url = strip_query(url);
        if err.is_timeout() {
            TransportError::Timeout {
                url,
                timeout: self.timeout,
            }
        } else if err.is_connect() {
            TransportError::Connect {
                url,
                reason: err.without_url().to_string(),
            }
        } else {
            TransportError::Request {
                url,
                reason: err.without_url().to_string(),
            }
        }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url, query: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .map_err(|err| self.classify(url, err))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|err| self.classify(url, err))?;
        Ok(RawResponse { status, body })
    }
}

fn strip_query(url: &Url) -> String {
    let mut bare = url.clone();
    bare.set_query(None);
    bare.to_string()
}
