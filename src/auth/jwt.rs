//! JWT Token Service
//!
//! Handles JWT creation, validation, and claims management for user authentication.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const ISSUER: &str = "mesto-server";

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User unique identifier
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

/// Why a presented token was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// A freshly signed token together with its expiry (unix seconds).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service with the provided secret and token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a JWT token for a user
    pub fn create_token(&self, user_id: Uuid, email: &str) -> Result<IssuedToken> {
        let now = Utc::now();
        let expiration = now + self.ttl;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: ISSUER.to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let jwt_service = JwtService::new("test_secret", Duration::hours(1));
        let user_id = Uuid::new_v4();

        let issued = jwt_service.create_token(user_id, "test@example.com").unwrap();
        let claims = jwt_service.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let jwt_service = JwtService::new("test_secret", Duration::seconds(-30));
        let issued = jwt_service.create_token(Uuid::new_v4(), "old@example.com").unwrap();

        assert_eq!(jwt_service.verify(&issued.token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let ours = JwtService::new("secret-a", Duration::hours(1));
        let theirs = JwtService::new("secret-b", Duration::hours(1));
        let issued = theirs.create_token(Uuid::new_v4(), "x@example.com").unwrap();

        assert!(matches!(ours.verify(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_foreign_token_is_invalid_not_expired() {
        let ours = JwtService::new("secret-a", Duration::hours(1));
        let theirs = JwtService::new("secret-b", Duration::seconds(-30));
        let issued = theirs.create_token(Uuid::new_v4(), "x@example.com").unwrap();

        assert!(matches!(ours.verify(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn truncated_token_is_invalid() {
        let jwt_service = JwtService::new("test_secret", Duration::hours(1));
        let issued = jwt_service.create_token(Uuid::new_v4(), "x@example.com").unwrap();
        let truncated = &issued.token[..issued.token.len() - 1];

        assert!(matches!(jwt_service.verify(truncated), Err(TokenError::Invalid(_))));
        assert!(matches!(jwt_service.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn wrong_issuer_is_invalid() {
        let jwt_service = JwtService::new("test_secret", Duration::hours(1));
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "x@example.com".into(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            iss: "someone-else".into(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();

        assert!(matches!(jwt_service.verify(&token), Err(TokenError::Invalid(_))));
    }
}
