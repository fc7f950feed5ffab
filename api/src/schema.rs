//! Validation layer.
//!
//! Shape is enforced by `serde` deserialization into the typed wire structs.
//! Constraints the type system cannot express (timestamp formats,
//! non-negative counts) are checked by [`Validate`] right after decoding.
//! Client-side input checks (login form, titles) live here too. Validation
//! never mutates: it accepts or rejects.

use crate::error::{ApiError, FieldViolation};
use crate::types::{
    AuthUser, DomainTask, EmptyData, Envelope, GetTasksResponse, ItemData, LoginData, LoginInputs,
    Todolist,
};
use chrono::{DateTime, NaiveDateTime};
use serde::de::DeserializeOwned;

/// Minimum password length accepted by the login form
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// A constraint violated by a decoded response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path to the offending value
    pub path: String,
    /// What was wrong with it
    pub message: String,
}

impl SchemaViolation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    fn nested(self, parent: &str) -> Self {
        Self {
            path: format!("{parent}.{}", self.path),
            message: self.message,
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Boundary checks applied after deserialization
pub trait Validate {
    /// Accept or reject the decoded value
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    fn validate(&self) -> Result<(), SchemaViolation>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), SchemaViolation> {
        for (index, item) in self.iter().enumerate() {
            item.validate().map_err(|v| v.nested(&format!("[{index}]")))?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Envelope<T> {
    fn validate(&self) -> Result<(), SchemaViolation> {
        self.data.validate().map_err(|v| v.nested("data"))
    }
}

impl<T: Validate> Validate for ItemData<T> {
    fn validate(&self) -> Result<(), SchemaViolation> {
        self.item.validate().map_err(|v| v.nested("item"))
    }
}

impl Validate for serde_json::Value {
    fn validate(&self) -> Result<(), SchemaViolation> {
        Ok(())
    }
}

impl Validate for EmptyData {
    fn validate(&self) -> Result<(), SchemaViolation> {
        Ok(())
    }
}

impl Validate for Todolist {
    fn validate(&self) -> Result<(), SchemaViolation> {
        check_datetime("addedDate", &self.added_date)
    }
}

impl Validate for DomainTask {
    fn validate(&self) -> Result<(), SchemaViolation> {
        check_datetime("addedDate", &self.added_date)
    }
}

impl Validate for GetTasksResponse {
    fn validate(&self) -> Result<(), SchemaViolation> {
        if self.total_count < 0 {
            return Err(SchemaViolation::new(
                "totalCount",
                format!("must be non-negative, got {}", self.total_count),
            ));
        }
        self.items.validate().map_err(|v| v.nested("items"))
    }
}

impl Validate for LoginData {
    fn validate(&self) -> Result<(), SchemaViolation> {
        if self.token.is_empty() {
            return Err(SchemaViolation::new("token", "must not be empty"));
        }
        Ok(())
    }
}

impl Validate for AuthUser {
    fn validate(&self) -> Result<(), SchemaViolation> {
        Ok(())
    }
}

/// ISO-8601 date-time, with or without an offset
fn check_datetime(path: &str, value: &str) -> Result<(), SchemaViolation> {
    let local = value.parse::<NaiveDateTime>().is_ok();
    if local || DateTime::parse_from_rfc3339(value).is_ok() {
        Ok(())
    } else {
        Err(SchemaViolation::new(
            path,
            format!("expected ISO-8601 date-time, got {value:?}"),
        ))
    }
}

/// Decode and validate a response body
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when the body does not decode into `T`
/// or violates one of its constraints. The diagnostic is logged here.
pub fn parse<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(body).map_err(|error| {
        tracing::error!(%error, "Response body failed to decode");
        ApiError::Validation {
            detail: error.to_string(),
        }
    })?;

    check(value)
}

/// Decode and validate an already-parsed JSON value (an envelope payload)
///
/// # Errors
///
/// Returns [`ApiError::Validation`] like [`parse`].
pub fn from_value<T>(value: serde_json::Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_value(value).map_err(|error| {
        tracing::error!(%error, "Response payload failed to decode");
        ApiError::Validation {
            detail: error.to_string(),
        }
    })?;
    check(value)
}

fn check<T: Validate>(value: T) -> Result<T, ApiError> {
    value.validate().map_err(|violation| {
        tracing::error!(%violation, "Response body failed validation");
        ApiError::Validation {
            detail: violation.to_string(),
        }
    })?;
    Ok(value)
}

/// Validate email address format.
///
/// - Exactly one `@` with non-empty local and domain parts
/// - Domain has at least one dot and no empty labels
/// - Length between 3 and 255 characters
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local_chars =
        |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local_chars)
        && domain.chars().all(valid_domain_chars)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

impl LoginInputs {
    /// Check the form before submitting it
    ///
    /// # Errors
    ///
    /// Returns one violation per rejected field.
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        if !is_valid_email(&self.email) {
            violations.push(FieldViolation::new("email", "Incorrect e-mail"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            violations.push(FieldViolation::new(
                "password",
                format!("Minimum length is {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

/// Check a todolist or task title before sending it
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] for an empty or blank title.
pub fn validate_title(title: &str) -> Result<String, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_input("title", "Title is required"));
    }
    Ok(trimmed.to_string())
}
