//! Signed request construction and execution.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::response::StoredResponse;
use crate::signing::{Clock, SignedHash, SystemClock, sign};
use crate::transport::{Transport, TransportError};

/// Key pair and base URL used to sign requests.
///
/// Each scenario owns its own copy, so replacing the private key affects
/// only the scenario that did it. `Debug` output never includes the private
/// key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL that endpoints are joined onto.
    pub base_url: Url,
    /// Public key, sent as `apikey`.
    pub public_key: String,
    /// Private key, only ever used as signing input.
    pub private_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url.as_str())
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A request that has been signed but not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Base URL joined with the endpoint, without a query string.
    pub url: Url,
    /// Endpoint as written in the step.
    pub endpoint: String,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Public key sent as `apikey`.
    pub public_key: String,
    /// Signature sent as `hash`.
    pub hash: SignedHash,
}

impl PendingRequest {
    /// The `ts`, `apikey` and `hash` parameters, in that order.
    #[must_use]
    pub fn query(&self) -> [(&'static str, String); 3] {
        [
            ("ts", self.timestamp.to_string()),
            ("apikey", self.public_key.clone()),
            ("hash", self.hash.as_str().to_string()),
        ]
    }

    /// Full request URL including the query string.
    #[must_use]
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().extend_pairs(self.query());
        url
    }
}

/// Join `endpoint` onto `base`, tolerating a missing trailing slash on the
/// base and a leading slash on the endpoint.
///
/// # Errors
/// Returns [`TransportError::InvalidEndpoint`] when the result is not a
/// valid URL.
///
/// # Examples
/// ```
/// use apibdd::request::endpoint_url;
/// use url::Url;
///
/// let base = Url::parse("https://gateway.example/v1/public").expect("valid URL");
/// let url = endpoint_url(&base, "/comics").expect("valid endpoint");
/// assert_eq!(url.as_str(), "https://gateway.example/v1/public/comics");
/// ```
pub fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url, TransportError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(endpoint.trim_start_matches('/'))
        .map_err(|source| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })
}

/// Signs and sends GET requests through a shared [`Transport`].
///
/// Cloning is cheap; the transport and clock are reference-counted and hold
/// no per-scenario state.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor").finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Use `transport` with the system clock.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build and sign a request for `endpoint`.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidEndpoint`] when the endpoint cannot
    /// be joined onto the base URL.
    pub fn prepare(
        &self,
        credentials: &Credentials,
        endpoint: &str,
    ) -> Result<PendingRequest, TransportError> {
        let timestamp = self.clock.unix_seconds();
        Ok(PendingRequest {
            url: endpoint_url(&credentials.base_url, endpoint)?,
            endpoint: endpoint.to_string(),
            timestamp,
            public_key: credentials.public_key.clone(),
            hash: sign(timestamp, &credentials.public_key, &credentials.private_key),
        })
    }

    /// Send a prepared request.
    ///
    /// # Errors
    /// Propagates [`TransportError`] from the transport.
    pub fn execute(&self, request: &PendingRequest) -> Result<StoredResponse, TransportError> {
        debug!(url = %request.full_url(), "sending GET request");
        let query = request.query();
        let pairs: Vec<(&str, &str)> = query
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        let raw = self.transport.get(&request.url, &pairs)?;
        debug!(status = raw.status, endpoint = %request.endpoint, "received response");
        Ok(StoredResponse::from(raw))
    }

    /// Sign, send and store a GET to `endpoint`.
    ///
    /// # Errors
    /// Returns [`TransportError`] when the URL is invalid or the request
    /// fails without a status code.
    pub fn get(
        &self,
        credentials: &Credentials,
        endpoint: &str,
    ) -> Result<StoredResponse, TransportError> {
        let request = self.prepare(credentials, endpoint)?;
        self.execute(&request)
    }
}
