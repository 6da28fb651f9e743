use crate::domain::auth::{TokenPair, UserClaims, hash_token};
use crate::domain::session::{RotationOutcome, SessionKeyRecord};
use crate::error::{AppError, Result};
use crate::services::token_service::TokenService;
use crate::storage::{KeyTokenStore, ShopStore};
use opentelemetry::{KeyValue, global, metrics::Counter};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

const REPLAY_MESSAGE: &str = "Something went wrong! Please log in again";

#[derive(Clone, Debug)]
struct Metrics {
    rotations_total: Counter<u64>,
    revocations_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("storefront-server");
        Self {
            rotations_total: meter
                .u64_counter("storefront_session_rotations_total")
                .with_description("Total number of successful refresh token rotations")
                .build(),
            revocations_total: meter
                .u64_counter("storefront_session_revocations_total")
                .with_description("Sessions revoked because a used refresh token was presented")
                .build(),
        }
    }
}

/// An authenticated caller: their session record and the identity proven by the presented token.
#[derive(Debug, Clone)]
pub struct Session {
    pub record: SessionKeyRecord,
    pub claims: UserClaims,
    /// Set when the caller authenticated with a refresh token.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RotatedSession {
    pub user: UserClaims,
    pub tokens: TokenPair,
}

/// Identity headers as presented by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub client_id: Option<&'a str>,
    pub access_token: Option<&'a str>,
    pub refresh_token: Option<&'a str>,
}

/// Refresh-token rotation with replay detection, plus request authentication.
#[derive(Clone, Debug)]
pub struct SessionService {
    key_tokens: Arc<dyn KeyTokenStore>,
    shops: Arc<dyn ShopStore>,
    tokens: TokenService,
    metrics: Metrics,
}

impl SessionService {
    #[must_use]
    pub fn new(key_tokens: Arc<dyn KeyTokenStore>, shops: Arc<dyn ShopStore>, tokens: TokenService) -> Self {
        Self { key_tokens, shops, tokens, metrics: Metrics::new() }
    }

    /// Resolves the caller's session from their identity headers.
    ///
    /// A refresh token takes precedence over an access token. Either must verify against the
    /// session's secrets and name the same user as `x-client-id`.
    ///
    /// # Errors
    /// `AuthError` for missing headers or a user mismatch, `NotFound` when the user has no
    /// session, `InvalidToken` when verification fails.
    #[tracing::instrument(skip(self, credentials), fields(user_id = tracing::field::Empty), err(level = "debug"))]
    pub async fn authenticate(&self, credentials: Credentials<'_>) -> Result<Session> {
        let client_id = credentials.client_id.ok_or_else(|| AppError::auth("Invalid Request"))?;
        let user_id = Uuid::parse_str(client_id).map_err(|_| AppError::auth("Invalid Request"))?;
        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        let record = self.key_tokens.find_by_user(user_id).await?.ok_or_else(|| AppError::not_found("Not found keyStore"))?;

        if let Some(refresh_token) = credentials.refresh_token {
            let claims = self.tokens.verify_refresh(refresh_token, &record.secrets)?;
            if claims.user_id != user_id {
                return Err(AppError::auth("Invalid UserId"));
            }
            return Ok(Session { record, claims, refresh_token: Some(refresh_token.to_string()) });
        }

        let access_token = credentials.access_token.ok_or_else(|| AppError::auth("Invalid Request"))?;
        let access_token = access_token.strip_prefix("Bearer ").unwrap_or(access_token);
        let claims = self.tokens.verify_access(access_token, &record.secrets)?;
        if claims.user_id != user_id {
            return Err(AppError::auth("Invalid UserId"));
        }
        Ok(Session { record, claims, refresh_token: None })
    }

    /// Exchanges the presented refresh token for a new pair.
    ///
    /// A token found among the used ones means it was stolen or replayed: the whole session is
    /// revoked and the caller must log in again.
    ///
    /// # Errors
    /// `Forbidden` on replay (the session is deleted), `AuthError` when the token is not the
    /// current one or the shop no longer exists. A token superseded by a concurrent login fails
    /// with `AuthError` and leaves the new session in place.
    #[tracing::instrument(
        skip(self, refresh_token, claims, record),
        fields(user_id = %claims.user_id),
        err(level = "warn")
    )]
    pub async fn validate_and_rotate(
        &self,
        refresh_token: &str,
        claims: &UserClaims,
        record: &SessionKeyRecord,
    ) -> Result<RotatedSession> {
        if record.has_used(refresh_token) {
            return Err(self.revoke(claims.user_id, "used refresh token presented").await);
        }

        if !record.is_current(refresh_token) {
            return Err(AppError::auth("Shop is not registered"));
        }

        if self.shops.find_by_email(&claims.email).await?.is_none() {
            return Err(AppError::auth("Shop is not registered"));
        }

        let tokens = self.tokens.create_token_pair(claims, &record.secrets)?;

        match self.key_tokens.rotate(claims.user_id, &hash_token(refresh_token), &hash_token(&tokens.refresh_token)).await? {
            RotationOutcome::Rotated => {
                self.metrics.rotations_total.add(1, &[]);
                tracing::info!("Refresh token rotated");
                Ok(RotatedSession { user: claims.clone(), tokens })
            }
            RotationOutcome::Stale => self.resolve_stale(refresh_token, claims.user_id).await,
            RotationOutcome::Missing => Err(AppError::auth("Shop is not registered")),
        }
    }

    /// The record changed between the snapshot and the swap. Only a concurrent rotation leaves the
    /// presented token in the used set; a fresh login resets the record and the token is merely stale.
    async fn resolve_stale(&self, refresh_token: &str, user_id: Uuid) -> Result<RotatedSession> {
        match self.key_tokens.find_by_user(user_id).await? {
            Some(current) if current.has_used(refresh_token) => Err(self.revoke(user_id, "lost rotation race").await),
            _ => Err(AppError::auth("Shop is not registered")),
        }
    }

    async fn revoke(&self, user_id: Uuid, reason: &'static str) -> AppError {
        tracing::warn!(reason, "Refresh token replay detected, revoking session");
        self.metrics.revocations_total.add(1, &[KeyValue::new("reason", reason)]);
        match self.key_tokens.delete_by_user(user_id).await {
            Ok(_) => AppError::forbidden(REPLAY_MESSAGE),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::jwt::JwtCodec;
    use crate::adapters::memory;
    use crate::config::AuthConfig;
    use crate::domain::auth::SigningSecrets;
    use crate::domain::shop::{NewShop, Role};
    use crate::storage::Stores;

    struct Fixture {
        stores: Stores,
        service: SessionService,
        tokens: TokenService,
        claims: UserClaims,
    }

    async fn fixture() -> Fixture {
        let stores = memory::stores();
        let shop = stores
            .shops
            .create(NewShop {
                name: "Shop".into(),
                email: "shop@example.com".into(),
                password_hash: "hash".into(),
                roles: vec![Role::Shop],
            })
            .await
            .unwrap();
        let tokens = TokenService::new(Arc::new(JwtCodec), &AuthConfig::default());
        let service = SessionService::new(stores.key_tokens.clone(), stores.shops.clone(), tokens.clone());
        let claims = UserClaims::new(shop.id, shop.email);
        Fixture { stores, service, tokens, claims }
    }

    /// Logs the shop in and returns the issued refresh token.
    async fn login(f: &Fixture) -> String {
        let secrets = SigningSecrets::generate();
        let pair = f.tokens.create_token_pair(&f.claims, &secrets).unwrap();
        f.stores.key_tokens.upsert(SessionKeyRecord::issue(f.claims.user_id, &pair.refresh_token, secrets)).await.unwrap();
        pair.refresh_token
    }

    async fn record(f: &Fixture) -> SessionKeyRecord {
        f.stores.key_tokens.find_by_user(f.claims.user_id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_rotation_moves_token_to_used() {
        let f = fixture().await;
        let r1 = login(&f).await;

        let rotated = f.service.validate_and_rotate(&r1, &f.claims, &record(&f).await).await.unwrap();

        let after = record(&f).await;
        assert!(after.has_used(&r1));
        assert!(after.is_current(&rotated.tokens.refresh_token));
        assert!(!after.has_used(&rotated.tokens.refresh_token));
        assert_eq!(rotated.user, f.claims);
    }

    #[tokio::test]
    async fn test_replay_revokes_session() {
        let f = fixture().await;
        let r1 = login(&f).await;
        let rotated = f.service.validate_and_rotate(&r1, &f.claims, &record(&f).await).await.unwrap();

        let replay = f.service.validate_and_rotate(&r1, &f.claims, &record(&f).await).await;
        assert!(matches!(replay, Err(AppError::Forbidden(_))));
        assert!(f.stores.key_tokens.find_by_user(f.claims.user_id).await.unwrap().is_none());

        // The legitimate holder of the newer token is logged out too.
        let auth = f
            .service
            .authenticate(Credentials {
                client_id: Some(&f.claims.user_id.to_string()),
                refresh_token: Some(&rotated.tokens.refresh_token),
                access_token: None,
            })
            .await;
        assert!(matches!(auth, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_token_is_auth_failure() {
        let f = fixture().await;
        login(&f).await;
        let before = record(&f).await;

        let result = f.service.validate_and_rotate("r-unknown", &f.claims, &before).await;

        assert!(matches!(result, Err(AppError::AuthError(_))));
        let after = record(&f).await;
        assert_eq!(after.refresh_token_hash, before.refresh_token_hash);
        assert!(after.used_refresh_token_hashes.is_empty());
    }

    #[tokio::test]
    async fn test_rotation_requires_existing_shop() {
        let f = fixture().await;
        let r1 = login(&f).await;
        let ghost = UserClaims::new(f.claims.user_id, "gone@example.com");

        let result = f.service.validate_and_rotate(&r1, &ghost, &record(&f).await).await;

        assert!(matches!(result, Err(AppError::AuthError(_))));
        assert!(record(&f).await.is_current(&r1));
    }

    #[tokio::test]
    async fn test_concurrent_rotation_has_one_winner() {
        let f = fixture().await;
        let r1 = login(&f).await;
        let snapshot = record(&f).await;

        let (a, b) = tokio::join!(
            f.service.validate_and_rotate(&r1, &f.claims, &snapshot),
            f.service.validate_and_rotate(&r1, &f.claims, &snapshot),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|o| matches!(o, Err(AppError::Forbidden(_)))));
        assert!(f.stores.key_tokens.find_by_user(f.claims.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_during_rotation_keeps_new_session() {
        let f = fixture().await;
        let r1 = login(&f).await;
        let snapshot = record(&f).await;
        let r2 = login(&f).await;

        let result = f.service.validate_and_rotate(&r1, &f.claims, &snapshot).await;

        assert!(matches!(result, Err(AppError::AuthError(_))));
        let after = record(&f).await;
        assert!(after.is_current(&r2));
        assert!(after.used_refresh_token_hashes.is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_with_access_token() {
        let f = fixture().await;
        let secrets = SigningSecrets::generate();
        let pair = f.tokens.create_token_pair(&f.claims, &secrets).unwrap();
        f.stores.key_tokens.upsert(SessionKeyRecord::issue(f.claims.user_id, &pair.refresh_token, secrets)).await.unwrap();
        let client_id = f.claims.user_id.to_string();

        let bearer = format!("Bearer {}", pair.access_token);
        let session = f
            .service
            .authenticate(Credentials { client_id: Some(&client_id), access_token: Some(&bearer), refresh_token: None })
            .await
            .unwrap();
        assert_eq!(session.claims, f.claims);
        assert!(session.refresh_token.is_none());

        let missing = f.service.authenticate(Credentials { client_id: Some(&client_id), ..Credentials::default() }).await;
        assert!(matches!(missing, Err(AppError::AuthError(_))));

        let other_user = Uuid::new_v4().to_string();
        let unknown = f
            .service
            .authenticate(Credentials {
                client_id: Some(&other_user),
                access_token: Some(&pair.access_token),
                refresh_token: None,
            })
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }
}
