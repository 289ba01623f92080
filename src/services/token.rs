//! Access and refresh tokens
//!
//! HS256-signed JWTs. Both kinds carry the user id and username; the
//! `token_type` claim keeps an access token from being used as a refresh
//! token and the other way round.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::User;

/// Which job a token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// User id from `sub`
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid(format!("non-numeric subject: {}", self.sub)))
    }
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token errors. Callers collapse all of these into one authentication failure.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Expected a {expected} token, got a {found} token")]
    WrongKind { expected: TokenKind, found: TokenKind },

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies tokens with a shared HMAC secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_minutes),
            Duration::days(config.refresh_token_days),
        )
    }

    /// Issue an access/refresh pair for a user
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user.id, &user.username, TokenKind::Access)?,
            refresh: self.issue(user.id, &user.username, TokenKind::Refresh)?,
        })
    }

    pub fn issue(&self, user_id: i64, username: &str, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type: kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, expiry and kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| convert_jwt_error(&e))?
            .claims;

        if claims.token_type != expected {
            return Err(TokenError::WrongKind {
                expected,
                found: claims.token_type,
            });
        }

        Ok(claims)
    }
}

fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::Invalid("signature verification failed".into()),
        ErrorKind::Base64(err) => TokenError::Invalid(format!("invalid base64: {}", err)),
        ErrorKind::Json(err) => TokenError::Invalid(format!("invalid claims: {}", err)),
        _ => TokenError::Invalid(e.to_string()),
    }
}
