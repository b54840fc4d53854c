//! Session tokens for staff accounts
//!
//! Tokens are HS256-signed and carry the user's id, email and role. The role
//! in a token is a snapshot; handlers that care about the current role or
//! status reload the user.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::MIN_JWT_SECRET_LEN;
use crate::error::RegistryError;

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signs and checks session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    expiry_seconds: u64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer; the secret must be at least 32 characters
    pub fn new(secret: impl Into<String>, expiry_seconds: u64) -> Result<Self, RegistryError> {
        let secret = secret.into();
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(RegistryError::Config(format!(
                "JWT secret must be at least {} characters",
                MIN_JWT_SECRET_LEN
            )));
        }
        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Issuer for dev mode with a fixed, well-known secret
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 8 * 60 * 60,
        }
    }

    /// Build the issuer the config asks for
    pub fn from_config(config: &crate::config::Config) -> Result<Self, RegistryError> {
        if config.dev_mode && config.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Ok(Self {
                expiry_seconds: config.jwt_expiry_seconds,
                ..Self::new_dev()
            });
        }
        Self::new(config.jwt_secret.clone(), config.jwt_expiry_seconds)
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: &str, email: &str, role: &str) -> Result<String, RegistryError> {
        let now = unix_now()?;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| RegistryError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, RegistryError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                ErrorKind::InvalidToken => "Invalid token",
                _ => "Token validation failed",
            };
            RegistryError::Unauthorized(msg.into())
        })
    }
}

fn unix_now() -> Result<u64, RegistryError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| RegistryError::Internal(format!("System time error: {}", e)))
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
