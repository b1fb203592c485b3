//! Stored HTTP responses with lazily parsed JSON.

use std::sync::OnceLock;

use serde_json::Value;

use crate::transport::RawResponse;

/// Result of parsing a response body as JSON.
///
/// Bodies that are not JSON, such as an HTML error page returned with a
/// `401`, become [`JsonView::Invalid`] instead of an error so that status
/// checks never trip over them.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonView {
    /// The body parsed successfully.
    Document(Value),
    /// The body is not valid JSON.
    Invalid(String),
}

impl JsonView {
    fn parse(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => Self::Document(value),
            Err(err) => Self::Invalid(err.to_string()),
        }
    }

    /// The parsed document, if any.
    #[must_use]
    pub fn document(&self) -> Option<&Value> {
        match self {
            Self::Document(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}

/// The last response received by a scenario.
///
/// # Examples
/// ```
/// use apibdd::{JsonView, StoredResponse};
///
/// let response = StoredResponse::new(401, "<html>Unauthorized</html>");
/// assert_eq!(response.status(), 401);
/// assert!(matches!(response.json(), JsonView::Invalid(_)));
/// ```
#[derive(Debug, Clone)]
pub struct StoredResponse {
    status: u16,
    body: String,
    json: OnceLock<JsonView>,
}

impl StoredResponse {
    /// Store a status code and raw body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            json: OnceLock::new(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// JSON view of the body, parsed on first access.
    pub fn json(&self) -> &JsonView {
        self.json.get_or_init(|| JsonView::parse(&self.body))
    }

    /// Whether the body has been parsed yet.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.json.get().is_some()
    }
}

impl From<RawResponse> for StoredResponse {
    fn from(raw: RawResponse) -> Self {
        Self::new(raw.status, raw.body)
    }
}
