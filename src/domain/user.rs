use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::validation::PHONE_RE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_active: bool,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login credential record, stored separately from the user table.
/// Never serialized to the wire.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: u32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserData {
    #[validate(length(min = 1, message = "name is not allowed to be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(regex(path = *PHONE_RE, message = "phone must contain at least 10 digits"))]
    pub phone: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub department: Option<String>,
}

fn default_is_active() -> bool {
    true
}

/// Partial update payload. `department` is double-wrapped so an explicit
/// `null` (clear the field) can be told apart from an absent key (leave
/// untouched). Unknown keys, including `id`, are dropped by serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserData {
    #[validate(length(min = 1, message = "name is not allowed to be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "phone must contain at least 10 digits"))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub department: Option<Option<String>>,
}

// Plain serde collapses JSON `null` into the outer `None`; wrapping the
// inner Option keeps absent → `None` and `null` → `Some(None)`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateUserData {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.is_active.is_none()
            && self.department.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterData {
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is not allowed to be empty"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginData {
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is not allowed to be empty"))]
    pub password: String,
}
