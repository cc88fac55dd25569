//! Error types for JIRA API operations.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during JIRA API operations.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Configuration is missing or incomplete.
    #[error("JIRA configuration required: {0}")]
    ConfigMissing(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status_code}: {payload} ({url})")]
    RemoteApi {
        status_code: u16,
        payload: ErrorPayload,
        url: String,
    },

    /// An operation needing a loaded resource was called on an unbound handle.
    #[error("Invalid resource state: {0}")]
    InvalidResourceState(String),

    /// Malformed input to the materializer or a template/identifier mismatch.
    #[error("Materialization contract violated: {0}")]
    Materialization(String),

    /// A registry pattern failed to compile.
    #[error("Invalid resource pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl JiraError {
    /// Server-supplied error messages, if this is a remote error carrying any.
    pub fn error_messages(&self) -> Option<&[String]> {
        match self {
            JiraError::RemoteApi {
                payload: ErrorPayload::Messages(messages),
                ..
            } => Some(messages),
            _ => None,
        }
    }

    /// HTTP status of a remote error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            JiraError::RemoteApi { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Body of a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// Structured messages parsed from a JSON error document.
    Messages(Vec<String>),
    /// The raw body, when it carried no recognizable error fields.
    Body(String),
}

impl ErrorPayload {
    /// Parse a response body into an error payload.
    ///
    /// Newer servers answer with a single `message`; older ones wrap their
    /// messages in an `errorMessages` list, with per-field problems under
    /// `errors`.
    pub fn from_body(body: &str) -> Self {
        let Ok(Value::Object(json)) = serde_json::from_str::<Value>(body) else {
            return ErrorPayload::Body(body.to_string());
        };

        if let Some(message) = json.get("message").and_then(Value::as_str) {
            return ErrorPayload::Messages(vec![message.to_string()]);
        }

        let mut messages: Vec<String> = Vec::new();
        let mut recognized = false;

        if let Some(list) = json.get("errorMessages").and_then(Value::as_array) {
            recognized = true;
            messages.extend(list.iter().map(value_text));
        }
        if let Some(errors) = json.get("errors").and_then(Value::as_object) {
            recognized = true;
            messages.extend(
                errors
                    .iter()
                    .map(|(field, err)| format!("{field}: {}", value_text(err))),
            );
        }

        if recognized {
            ErrorPayload::Messages(messages)
        } else {
            ErrorPayload::Body(body.to_string())
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPayload::Messages(messages) if messages.is_empty() => f.write_str("(no message)"),
            ErrorPayload::Messages(messages) => write!(f, "\"{}\"", messages.join("; ")),
            ErrorPayload::Body(body) if body.is_empty() => f.write_str("(empty body)"),
            ErrorPayload::Body(body) => f.write_str(body),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result type alias for JIRA operations.
pub type Result<T> = core::result::Result<T, JiraError>;
