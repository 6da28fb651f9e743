use crate::domain::auth::{self, SigningSecrets, TokenPair, UserClaims};
use crate::domain::session::SessionKeyRecord;
use crate::domain::shop::{NewShop, Role, ShopInfo};
use crate::error::{AppError, Result};
use crate::services::token_service::TokenService;
use crate::storage::{KeyTokenStore, ShopStore};
use opentelemetry::{global, metrics::Counter};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    signup_total: Counter<u64>,
    login_total: Counter<u64>,
    logout_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("storefront-server");
        Self {
            signup_total: meter
                .u64_counter("storefront_signup_total")
                .with_description("Total number of shops registered")
                .build(),
            login_total: meter
                .u64_counter("storefront_login_total")
                .with_description("Total number of successful logins")
                .build(),
            logout_total: meter
                .u64_counter("storefront_logout_total")
                .with_description("Total number of logouts")
                .build(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedShop {
    pub shop: ShopInfo,
    pub tokens: TokenPair,
}

#[derive(Clone, Debug)]
pub struct AccessService {
    shops: Arc<dyn ShopStore>,
    key_tokens: Arc<dyn KeyTokenStore>,
    tokens: TokenService,
    metrics: Metrics,
}

impl AccessService {
    #[must_use]
    pub fn new(shops: Arc<dyn ShopStore>, key_tokens: Arc<dyn KeyTokenStore>, tokens: TokenService) -> Self {
        Self { shops, key_tokens, tokens, metrics: Metrics::new() }
    }

    /// # Errors
    /// `BadRequest` if the email is already registered.
    #[tracing::instrument(skip(self, name, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn sign_up(&self, name: String, email: String, password: String) -> Result<AuthenticatedShop> {
        let email = normalize_email(&email);
        if name.trim().is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::bad_request("Name, email and password are required"));
        }
        if self.shops.find_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("Shop already registered!"));
        }

        let password_hash = hash_password(password).await?;
        let shop = self
            .shops
            .create(NewShop { name, email, password_hash, roles: vec![Role::Shop] })
            .await
            .map_err(|e| match e {
                AppError::Conflict(message) => AppError::BadRequest(message),
                other => other,
            })?;
        tracing::Span::current().record("user_id", tracing::field::display(shop.id));

        let tokens = self.open_session(UserClaims::new(shop.id, &shop.email)).await?;
        self.metrics.signup_total.add(1, &[]);
        tracing::info!("Shop registered");

        Ok(AuthenticatedShop { shop: ShopInfo::from(&shop), tokens })
    }

    /// # Errors
    /// `BadRequest` for an unknown email, `AuthError` for a wrong password.
    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, email: String, password: String) -> Result<AuthenticatedShop> {
        let email = normalize_email(&email);
        let shop = self.shops.find_by_email(&email).await?.ok_or_else(|| AppError::bad_request("Shop is not registered"))?;
        tracing::Span::current().record("user_id", tracing::field::display(shop.id));

        if !verify_password(password, shop.password_hash.clone()).await? {
            return Err(AppError::auth("Authentication error"));
        }

        let tokens = self.open_session(UserClaims::new(shop.id, &shop.email)).await?;
        self.metrics.login_total.add(1, &[]);

        Ok(AuthenticatedShop { shop: ShopInfo::from(&shop), tokens })
    }

    /// Deletes the caller's session record.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the delete fails.
    #[tracing::instrument(skip(self, record), fields(user_id = %record.user_id), err)]
    pub async fn logout(&self, record: &SessionKeyRecord) -> Result<bool> {
        let deleted = self.key_tokens.delete_by_id(record.id).await?;
        self.metrics.logout_total.add(1, &[]);
        Ok(deleted)
    }

    /// Fresh secrets every time; any previous session of the user is replaced.
    async fn open_session(&self, claims: UserClaims) -> Result<TokenPair> {
        let secrets = SigningSecrets::generate();
        let tokens = self.tokens.create_token_pair(&claims, &secrets)?;
        self.key_tokens.upsert(SessionKeyRecord::issue(claims.user_id, &tokens.refresh_token, secrets)).await?;
        Ok(tokens)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password)).await.map_err(|_| AppError::Internal)?
}

async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || auth::verify_password(&password, &password_hash))
        .await
        .map_err(|_| AppError::Internal)?
}
