//! Checks against the stored response.
//!
//! Each check takes the scenario's optional response so a check that runs
//! before any request fails with [`ValidationError::NoResponse`] rather than
//! panicking. JSON checks branch explicitly on [`JsonView`].

use serde_json::Value;
use thiserror::Error;

use crate::response::{JsonView, StoredResponse};

const EXCERPT_CHARS: usize = 200;

/// A response check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No request has been sent in this scenario.
    #[error("no stored response: send a request before checking it")]
    NoResponse,
    /// The status code differs.
    #[error("expected status code {expected}, but got {actual}")]
    StatusMismatch {
        /// Expected status.
        expected: u16,
        /// Received status.
        actual: u16,
    },
    /// The body is empty or lacks the expected text.
    #[error("expected response body to contain '{needle}', body was: {body_excerpt}")]
    BodyContent {
        /// Text searched for, case-insensitively.
        needle: String,
        /// Leading part of the body.
        body_excerpt: String,
    },
    /// A JSON path is absent or has the wrong shape.
    #[error("response JSON is missing '{path}' or it has the wrong type")]
    MissingField {
        /// Dotted path that was looked up.
        path: String,
    },
    /// `data.results` is present but empty.
    #[error("response JSON 'data.results' is empty")]
    EmptyResults,
    /// The first result's field has another value.
    #[error("expected first result {field} '{expected}', but got '{actual}'")]
    FieldValueMismatch {
        /// Field name.
        field: String,
        /// Expected string value.
        expected: String,
        /// Found value, JSON-rendered when not a string.
        actual: String,
    },
    /// The body is not JSON.
    #[error("response body is not valid JSON: {reason}")]
    InvalidJson {
        /// Parser error.
        reason: String,
    },
    /// An endpoint with no known entity field.
    #[error("endpoint '{endpoint}' is not recognized")]
    UnknownEntity {
        /// Endpoint as written in the step.
        endpoint: String,
    },
}

/// Entity types returned by the supported endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Results of the `comics` endpoint.
    Comics,
    /// Results of the `characters` endpoint.
    Characters,
}

impl EntityKind {
    /// Field that identifies an entity of this kind.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Comics => "title",
            Self::Characters => "name",
        }
    }

    /// Map an endpoint name, ignoring case.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownEntity`] for any other endpoint.
    ///
    /// # Examples
    /// ```
    /// use apibdd::EntityKind;
    ///
    /// assert_eq!(EntityKind::from_endpoint("Comics"), Ok(EntityKind::Comics));
    /// assert_eq!(EntityKind::Characters.field_name(), "name");
    /// assert!(EntityKind::from_endpoint("events").is_err());
    /// ```
    pub fn from_endpoint(endpoint: &str) -> Result<Self, ValidationError> {
        let trimmed = endpoint.trim().trim_matches('/');
        if trimmed.eq_ignore_ascii_case("comics") {
            Ok(Self::Comics)
        } else if trimmed.eq_ignore_ascii_case("characters") {
            Ok(Self::Characters)
        } else {
            Err(ValidationError::UnknownEntity {
                endpoint: endpoint.to_string(),
            })
        }
    }
}

fn stored(response: Option<&StoredResponse>) -> Result<&StoredResponse, ValidationError> {
    response.ok_or(ValidationError::NoResponse)
}

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Check the status code.
///
/// # Errors
/// [`ValidationError::NoResponse`] or [`ValidationError::StatusMismatch`].
pub fn expect_status(
    response: Option<&StoredResponse>,
    expected: u16,
) -> Result<(), ValidationError> {
    let actual = stored(response)?.status();
    if actual == expected {
        Ok(())
    } else {
        Err(ValidationError::StatusMismatch { expected, actual })
    }
}

/// Check that the body is non-empty and contains `needle`, ignoring case.
///
/// # Errors
/// [`ValidationError::NoResponse`] or [`ValidationError::BodyContent`].
pub fn expect_body_contains(
    response: Option<&StoredResponse>,
    needle: &str,
) -> Result<(), ValidationError> {
    let body = stored(response)?.body();
    if !body.is_empty() && body.to_lowercase().contains(&needle.to_lowercase()) {
        Ok(())
    } else {
        Err(ValidationError::BodyContent {
            needle: needle.to_string(),
            body_excerpt: excerpt(body),
        })
    }
}

/// Return the non-empty `data.results` array.
///
/// # Errors
/// [`ValidationError::NoResponse`], [`ValidationError::InvalidJson`],
/// [`ValidationError::MissingField`] or [`ValidationError::EmptyResults`].
///
/// # Examples
/// ```
/// use apibdd::{StoredResponse, ValidationError};
/// use apibdd::validator::expect_results_envelope;
///
/// let empty = StoredResponse::new(200, r#"{"data":{"results":[]}}"#);
/// assert_eq!(expect_results_envelope(Some(&empty)), Err(ValidationError::EmptyResults));
/// ```
pub fn expect_results_envelope(
    response: Option<&StoredResponse>,
) -> Result<&[Value], ValidationError> {
    let document = match stored(response)?.json() {
        JsonView::Document(value) => value,
        JsonView::Invalid(reason) => {
            return Err(ValidationError::InvalidJson {
                reason: reason.clone(),
            });
        }
    };
    let data = document
        .get("data")
        .ok_or_else(|| ValidationError::MissingField {
            path: "data".into(),
        })?;
    let results = data
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::MissingField {
            path: "data.results".into(),
        })?;
    if results.is_empty() {
        Err(ValidationError::EmptyResults)
    } else {
        Ok(results.as_slice())
    }
}

/// Check that the first result's `field` equals `expected`.
///
/// # Errors
/// Any envelope error, [`ValidationError::MissingField`] when the first
/// result lacks `field`, or [`ValidationError::FieldValueMismatch`].
pub fn expect_first_result_field(
    response: Option<&StoredResponse>,
    field: &str,
    expected: &str,
) -> Result<(), ValidationError> {
    let actual = first_result_field(response, field)?;
    match actual {
        Value::String(text) if text == expected => Ok(()),
        other => Err(ValidationError::FieldValueMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: render(other),
        }),
    }
}

/// Return `field` of the first entry in `data.results`.
///
/// # Errors
/// Any envelope error, or [`ValidationError::MissingField`] when the field
/// is absent.
pub fn first_result_field<'a>(
    response: Option<&'a StoredResponse>,
    field: &str,
) -> Result<&'a Value, ValidationError> {
    let results = expect_results_envelope(response)?;
    results
        .first()
        .and_then(|first| first.get(field))
        .ok_or_else(|| ValidationError::MissingField {
            path: format!("data.results[0].{field}"),
        })
}
