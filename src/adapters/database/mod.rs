mod api_key_repo;
mod cart_repo;
mod discount_repo;
mod key_token_repo;
mod product_repo;
mod records;
mod shop_repo;

pub use api_key_repo::PgApiKeyStore;
pub use cart_repo::PgCartStore;
pub use discount_repo::PgDiscountStore;
pub use key_token_repo::PgKeyTokenStore;
pub use product_repo::PgProductStore;
pub use shop_repo::PgShopStore;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::storage::Stores;
use backon::{ExponentialBuilder, Retryable};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool, retrying the first connection with backoff.
///
/// # Errors
/// Returns `sqlx::Error` if the database stays unreachable after the configured attempts.
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let retry_strategy = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(250))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(config.connect_retries);

    (|| async {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.url)
            .await
    })
    .retry(&retry_strategy)
    .notify(|e, duration| {
        tracing::warn!(error = %e, retry_in = ?duration, "Database connection failed, retrying...");
    })
    .await
}

/// Postgres-backed implementations of every store.
#[must_use]
pub fn stores(pool: &DbPool) -> Stores {
    Stores {
        shops: Arc::new(PgShopStore::new(pool.clone())),
        key_tokens: Arc::new(PgKeyTokenStore::new(pool.clone())),
        discounts: Arc::new(PgDiscountStore::new(pool.clone())),
        carts: Arc::new(PgCartStore::new(pool.clone())),
        products: Arc::new(PgProductStore::new(pool.clone())),
        api_keys: Arc::new(PgApiKeyStore::new(pool.clone())),
    }
}

/// Maps a unique-constraint violation to `AppError::Conflict`, anything else to `AppError::Database`.
fn conflict_on_unique(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
        _ => AppError::Database(e),
    }
}
