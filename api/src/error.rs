//! Error taxonomy for remote operations.
//!
//! Every remote call settles with `Result<T, ApiError>`. The variant says
//! where the failure came from; [`ApiError::user_message`] derives the text
//! the notification shows.

use crate::types::{FieldError, ResultCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback shown when the server rejects an operation without a message
pub const GENERIC_FAILURE_MESSAGE: &str = "Some error occurred";

/// Shown instead of the raw schema diagnostic
pub const VALIDATION_FAILURE_MESSAGE: &str = "Received data did not match the expected format";

/// One rejected input field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field name as the form knows it
    pub field: String,
    /// Inline message for the field
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for `field`
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Short tag distinguishing the failure classes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or HTTP-layer failure
    Transport,
    /// Envelope `resultCode` other than success
    Application,
    /// Response body failed the schema check
    Validation,
    /// Input rejected before anything was sent
    Input,
    /// Anything else
    Unexpected,
}

impl ErrorKind {
    /// Stable lowercase name, used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Application => "application",
            Self::Validation => "validation",
            Self::Input => "input",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Errors that can occur when talking to the todolists API
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network failure or non-success HTTP status
    #[error("Request failed: {message}")]
    Transport {
        /// HTTP status, when a response arrived
        status: Option<u16>,
        /// Body `message` when present, otherwise the transport error text
        message: String,
    },

    /// The server answered but rejected the operation
    #[error("Operation rejected ({result_code:?}): {}", first_message(.messages))]
    Application {
        /// Envelope result code
        result_code: ResultCode,
        /// Envelope messages
        messages: Vec<String>,
        /// Envelope field errors
        fields_errors: Vec<FieldError>,
    },

    /// The response body did not match the expected schema
    #[error("Response validation failed: {detail}")]
    Validation {
        /// Schema diagnostic, for logs only
        detail: String,
    },

    /// Input rejected client-side
    #[error("Invalid input: {}", join_violations(.violations))]
    InvalidInput {
        /// Per-field messages
        violations: Vec<FieldViolation>,
    },

    /// Any other failure
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

fn first_message(messages: &[String]) -> &str {
    messages.first().map_or(GENERIC_FAILURE_MESSAGE, String::as_str)
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// Input error for a single field
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    /// Which failure class this is
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Application { .. } => ErrorKind::Application,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InvalidInput { .. } => ErrorKind::Input,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// The text shown to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { message, .. } | Self::Unexpected(message) => message.clone(),
            Self::Application { messages, .. } => first_message(messages).to_string(),
            Self::Validation { .. } => VALIDATION_FAILURE_MESSAGE.to_string(),
            Self::InvalidInput { violations } => join_violations(violations),
        }
    }

    /// Per-field errors, from the server or from client-side checks
    #[must_use]
    pub fn field_violations(&self) -> Vec<FieldViolation> {
        match self {
            Self::Application { fields_errors, .. } => fields_errors
                .iter()
                .map(|e| FieldViolation::new(e.field.clone(), e.error.clone()))
                .collect(),
            Self::InvalidInput { violations } => violations.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::Validation {
                detail: error.to_string(),
            };
        }
        Self::Transport {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_message_uses_first_entry() {
        let error = ApiError::Application {
            result_code: ResultCode::Error,
            messages: vec!["Title is too long".to_string(), "second".to_string()],
            fields_errors: vec![],
        };
        assert_eq!(error.user_message(), "Title is too long");
        assert_eq!(error.kind(), ErrorKind::Application);
    }

    #[test]
    fn application_message_falls_back_when_empty() {
        let error = ApiError::Application {
            result_code: ResultCode::Error,
            messages: vec![],
            fields_errors: vec![],
        };
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn validation_hides_schema_detail() {
        let error = ApiError::Validation {
            detail: "missing field `order` at line 1 column 40".to_string(),
        };
        assert_eq!(error.user_message(), VALIDATION_FAILURE_MESSAGE);
        assert!(error.to_string().contains("missing field `order`"));
    }

    #[test]
    fn field_violations_come_from_server_field_errors() {
        let error = ApiError::Application {
            result_code: ResultCode::Error,
            messages: vec![],
            fields_errors: vec![FieldError {
                field: "email".to_string(),
                error: "Incorrect email".to_string(),
            }],
        };
        assert_eq!(
            error.field_violations(),
            vec![FieldViolation::new("email", "Incorrect email")]
        );
    }

    #[test]
    fn kinds_have_stable_names() {
        assert_eq!(ApiError::Unexpected("boom".into()).kind().as_str(), "unexpected");
        assert_eq!(
            ApiError::invalid_input("title", "Title is required").kind().as_str(),
            "input"
        );
    }
}
