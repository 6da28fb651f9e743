use crate::domain::auth::{SigningSecrets, hash_token};
use time::OffsetDateTime;
use uuid::Uuid;

/// A user's session key store. Refresh tokens are kept as SHA-256 digests.
#[derive(Debug, Clone)]
pub struct SessionKeyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub used_refresh_token_hashes: Vec<String>,
    pub secrets: SigningSecrets,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl SessionKeyRecord {
    /// Builds a fresh record whose current refresh token is `refresh_token` and whose used set is empty.
    #[must_use]
    pub fn issue(user_id: Uuid, refresh_token: &str, secrets: SigningSecrets) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_token_hash: hash_token(refresh_token),
            used_refresh_token_hashes: Vec::new(),
            secrets,
            created_at: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn has_used(&self, refresh_token: &str) -> bool {
        let hash = hash_token(refresh_token);
        self.used_refresh_token_hashes.iter().any(|used| *used == hash)
    }

    #[must_use]
    pub fn is_current(&self, refresh_token: &str) -> bool {
        self.refresh_token_hash == hash_token(refresh_token)
    }
}

/// Outcome of a compare-and-swap on the current refresh token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The expected token was current; it moved to the used set and the replacement is now current.
    Rotated,
    /// The record exists but the expected token is no longer current.
    Stale,
    /// No record exists for the user.
    Missing,
}
