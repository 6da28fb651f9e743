use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Identity carried inside both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub user_id: Uuid,
    pub email: String,
}

impl UserClaims {
    #[must_use]
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self { user_id, email: email.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Per-session secret material. `primary` signs access tokens, `secondary` signs refresh tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecrets {
    pub primary: String,
    pub secondary: String,
}

impl SigningSecrets {
    /// Generates two independent 64-byte secrets, hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        Self { primary: random_hex(64), secondary: random_hex(64) }
    }
}

impl fmt::Debug for SigningSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecrets").field("primary", &"<redacted>").field("secondary", &"<redacted>").finish()
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hashes a token using SHA-256 for storage at rest.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// # Errors
/// Returns `AppError::Internal` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash =
        Argon2::default().hash_password(password.as_bytes(), &salt).map_err(|_| AppError::Internal)?.to_string();
    Ok(password_hash)
}

/// # Errors
/// Returns `AppError::Internal` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AppError::Internal)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("password12345").unwrap();

        assert!(verify_password("password12345", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_secrets_are_distinct() {
        let a = SigningSecrets::generate();
        let b = SigningSecrets::generate();

        assert_eq!(a.primary.len(), 128);
        assert_ne!(a.primary, a.secondary);
        assert_ne!(a, b);
    }

    #[test]
    fn test_secrets_debug_redacted() {
        let secrets = SigningSecrets::generate();
        let debug = format!("{secrets:?}");
        assert!(!debug.contains(&secrets.primary));
    }

    #[test]
    fn test_token_hashing() {
        let hash1 = hash_token("my_token");
        let hash2 = hash_token("my_token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_token("other_token"));
    }
}
