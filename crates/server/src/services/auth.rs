//! Authentication service.
//!
//! Registration, login and profile operations over the credential store.
//! Passwords are hashed with Argon2id; login accepts a username
//! (case-insensitive) or an email address as the identifier.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use bookmarket_core::UserId;

use crate::db::{StoreError, UserStore};
use crate::models::{ProfileUpdateInput, RegistrationInput, User, ValidationErrors};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more request fields failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Wrong password, unknown identifier, or missing credentials. One
    /// variant for all three so responses do not reveal which part failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username or email already registered.
    #[error("{0}")]
    Taken(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Authentication service over the credential store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` listing every invalid field, or
    /// `AuthError::Taken` when the username or email is already in use.
    pub async fn register(&self, input: RegistrationInput) -> Result<User, AuthError> {
        let registration = input.validate()?;
        let password_hash = hash_password(&registration.password)?;

        let user = self
            .users
            .create_user(registration.username, registration.email, password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => AuthError::Taken(msg),
                other => AuthError::Store(other),
            })?;

        Ok(user)
    }

    /// Log in with a username or email and a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for any missing or wrong
    /// field; never reveals whether the identifier exists.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let (user, password_hash) = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Fetch a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, id: UserId) -> Result<User, AuthError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update a user's username and/or password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` on bad input, `AuthError::Taken`
    /// when the new username collides, `AuthError::UserNotFound` when the
    /// user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        input: ProfileUpdateInput,
    ) -> Result<User, AuthError> {
        let update = input.validate()?;
        let password_hash = match &update.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        self.users
            .update_user(id, update, password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => AuthError::Taken(msg),
                other => AuthError::Store(other),
            })?
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete a user's account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AuthError> {
        if self.users.delete_user(id).await? {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
