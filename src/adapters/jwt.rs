use crate::domain::auth::UserClaims;
use crate::error::{AppError, Result};
use crate::services::token_service::TokenCodec;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    #[serde(flatten)]
    user: UserClaims,
    /// Unique per token so two pairs minted in the same second never collide.
    jti: Uuid,
    iat: u64,
    exp: u64,
}

/// HS256 JSON Web Tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct JwtCodec;

impl JwtCodec {
    fn encode_claims(claims: &JwtClaims, secret: &str) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            AppError::Internal
        })
    }
}

fn now_secs() -> u64 {
    u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(0)
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &UserClaims, secret: &str, ttl: Duration) -> Result<String> {
        let iat = now_secs();
        let claims = JwtClaims { user: claims.clone(), jti: Uuid::new_v4(), iat, exp: iat + ttl.as_secs() };
        Self::encode_claims(&claims, secret)
    }

    fn verify(&self, token: &str, secret: &str) -> Result<UserClaims> {
        let data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(data.claims.user)
    }
}
