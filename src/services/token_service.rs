use crate::config::AuthConfig;
use crate::domain::auth::{SigningSecrets, TokenPair, UserClaims};
use crate::error::Result;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Signs and verifies compact tokens carrying `UserClaims`.
pub trait TokenCodec: Send + Sync + Debug {
    /// # Errors
    /// Returns `AppError::Internal` if the token cannot be produced.
    fn sign(&self, claims: &UserClaims, secret: &str, ttl: Duration) -> Result<String>;

    /// # Errors
    /// Returns `AppError::InvalidToken` for a bad signature, an expired token or malformed input.
    fn verify(&self, token: &str, secret: &str) -> Result<UserClaims>;
}

/// Mints access/refresh pairs from a session's signing secrets.
#[derive(Clone, Debug)]
pub struct TokenService {
    codec: Arc<dyn TokenCodec>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(codec: Arc<dyn TokenCodec>, config: &AuthConfig) -> Self {
        Self {
            codec,
            access_ttl: Duration::from_secs(config.access_token_ttl_secs),
            refresh_ttl: Duration::from_secs(config.refresh_token_ttl_secs),
        }
    }

    /// Access tokens are signed with the primary secret, refresh tokens with the secondary one.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if signing fails.
    pub fn create_token_pair(&self, claims: &UserClaims, secrets: &SigningSecrets) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.codec.sign(claims, &secrets.primary, self.access_ttl)?,
            refresh_token: self.codec.sign(claims, &secrets.secondary, self.refresh_ttl)?,
        })
    }

    /// # Errors
    /// Returns `AppError::InvalidToken` if the token was not issued with these secrets or has expired.
    pub fn verify_access(&self, token: &str, secrets: &SigningSecrets) -> Result<UserClaims> {
        self.codec.verify(token, &secrets.primary)
    }

    /// # Errors
    /// Returns `AppError::InvalidToken` if the token was not issued with these secrets or has expired.
    pub fn verify_refresh(&self, token: &str, secrets: &SigningSecrets) -> Result<UserClaims> {
        self.codec.verify(token, &secrets.secondary)
    }
}
