//! Stateless session tokens.
//!
//! Tokens are HS256-signed JWTs carrying the user id and a one hour
//! expiry. Nothing is persisted server-side, so a token cannot be revoked
//! before it expires; logout only clears the client's cookie. That trade
//! is acceptable for a bookstore cart session.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bookmarket_core::UserId;

/// How long an issued token stays valid.
pub const TOKEN_TTL: Duration = Duration::hours(1);

/// Errors from token verification or issuance.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature mismatch or structurally broken token.
    #[error("invalid token")]
    Invalid,

    /// The token was once valid but its expiry has passed. Kept distinct
    /// from [`TokenError::Invalid`] so clients can prompt a re-login.
    #[error("token expired")]
    Expired,

    /// Token could not be signed.
    #[error("token creation failed: {0}")]
    Creation(String),
}

/// Claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user id.
    sub: String,
    /// Issued-at (unix timestamp, seconds).
    iat: i64,
    /// Expiry (unix timestamp, seconds).
    exp: i64,
}

/// Issues and verifies session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// Build a token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for `user_id`, valid for [`TOKEN_TTL`] from now.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Creation`] if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Verify a token against the current time and return the user id.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] on signature mismatch or structural
    /// corruption, [`TokenError::Expired`] when the expiry has passed.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Issue a token as of an explicit instant.
    pub(crate) fn issue_at(
        &self,
        user_id: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + TOKEN_TTL).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Creation(e.to_string()))
    }

    /// Verify a token as of an explicit instant.
    ///
    /// Expiry is checked here against `now` rather than by the JWT library
    /// so the check is exact (no leeway) and testable without sleeping.
    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if now.timestamp() > data.claims.exp {
            return Err(TokenError::Expired);
        }

        UserId::parse(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("kR9#mP2$vL8@nQ4!xW7&zB3*cF6^hJ1%"))
    }

    #[test]
    fn round_trip_returns_the_user_id() {
        let svc = service();
        let user_id = UserId::generate();
        let token = svc.issue(user_id).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn accepted_just_before_expiry_rejected_just_after() {
        let svc = service();
        let issued = Utc::now();
        let token = svc.issue_at(UserId::generate(), issued).unwrap();

        assert!(svc.verify_at(&token, issued + Duration::minutes(59)).is_ok());
        assert!(matches!(
            svc.verify_at(&token, issued + Duration::minutes(61)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn garbage_is_invalid_not_expired() {
        let svc = service();
        assert!(matches!(svc.verify("not-a-token"), Err(TokenError::Invalid)));
        assert!(matches!(svc.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn tokens_from_a_different_secret_are_rejected() {
        let svc = service();
        let other = TokenService::new(&SecretString::from("q2W#e4R$t6Y^u8I*o0P!a3S@d5F&g7Hj"));
        let token = other.issue(UserId::generate()).unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let svc = service();
        let token = svc.issue(UserId::generate()).unwrap();
        // Flip a character in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        let payload = parts.get_mut(1).unwrap();
        let replacement = if payload.starts_with('A') { "B" } else { "A" };
        payload.replace_range(0..1, replacement);
        let tampered = parts.join(".");
        assert!(matches!(svc.verify(&tampered), Err(TokenError::Invalid)));
    }
}
