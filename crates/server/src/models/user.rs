//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookmarket_core::{Email, UserId, Username};

use super::validate::ValidationErrors;

/// Minimum password length accepted at registration and profile update.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A registered user.
///
/// The password hash lives in the credential store, never on this type,
/// so profile responses cannot leak it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display username (unique, matched case-insensitively).
    pub username: Username,
    /// User's email address (unique).
    pub email: Email,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Raw registration payload, validated before hashing and persistence.
#[derive(Debug, Deserialize)]
pub struct RegistrationInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration data.
#[derive(Debug)]
pub struct Registration {
    pub username: Username,
    pub email: Email,
    pub password: String,
}

impl RegistrationInput {
    /// Validate all fields, accumulating every failure.
    ///
    /// # Errors
    ///
    /// Returns the full list of field failures when any check fails.
    pub fn validate(self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = match self.username.as_deref() {
            None | Some("") => {
                errors.push("username", "is required");
                None
            }
            Some(raw) => match Username::parse(raw) {
                Ok(u) => Some(u),
                Err(e) => {
                    errors.push("username", e.to_string());
                    None
                }
            },
        };

        let email = match self.email.as_deref() {
            None | Some("") => {
                errors.push("email", "is required");
                None
            }
            Some(raw) => match Email::parse(raw) {
                Ok(e) => Some(e),
                Err(e) => {
                    errors.push("email", e.to_string());
                    None
                }
            },
        };

        let password = match self.password {
            None => {
                errors.push("password", "is required");
                None
            }
            Some(p) => {
                if let Err(msg) = validate_password(&p) {
                    errors.push("password", msg);
                    None
                } else {
                    Some(p)
                }
            }
        };

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) => Ok(Registration {
                username,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw profile-update payload. Both fields optional; absent means unchanged.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Validated profile update.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<Username>,
    pub password: Option<String>,
}

impl ProfileUpdateInput {
    /// Validate the provided fields.
    ///
    /// # Errors
    ///
    /// Returns field failures for any provided-but-invalid value, or a
    /// single failure when nothing was provided at all.
    pub fn validate(self) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut update = ProfileUpdate::default();

        if let Some(raw) = self.username {
            match Username::parse(&raw) {
                Ok(u) => update.username = Some(u),
                Err(e) => errors.push("username", e.to_string()),
            }
        }

        if let Some(p) = self.password {
            match validate_password(&p) {
                Ok(()) => update.password = Some(p),
                Err(msg) => errors.push("password", msg),
            }
        }

        if update.username.is_none() && update.password.is_none() && errors.is_empty() {
            errors.push("update", "at least one of username or password is required");
        }

        errors.into_result().map(|()| update)
    }
}

/// Check that a password meets the minimum requirements.
fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}
