use std::sync::LazyLock;

use regex::Regex;
use validator::{Validate, ValidationErrors};

use crate::domain::error::DomainError;
use crate::domain::user::UpdateUserData;

pub static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,}$").expect("phone pattern is valid"));

/// Surfaces only the first violated rule, keeping the error-message
/// contract stable regardless of how many rules failed.
fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .next()
        .unwrap_or_else(|| "Validation error".to_string())
}

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), DomainError> {
    payload
        .validate()
        .map_err(|e| DomainError::Invariant(first_message(&e)))
}

/// Update payloads additionally reject the empty partial update.
pub fn validate_update(payload: &UpdateUserData) -> Result<(), DomainError> {
    if payload.is_empty() {
        return Err(DomainError::Invariant(
            "update payload must contain at least one field".to_string(),
        ));
    }
    validate_payload(payload)
}
