#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;

use crate::adapters::database::DbPool;
use crate::adapters::jwt::JwtCodec;
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::access_service::AccessService;
use crate::services::api_key_service::ApiKeyService;
use crate::services::cart_service::CartService;
use crate::services::discount_service::DiscountService;
use crate::services::health_service::HealthService;
use crate::services::product_service::ProductService;
use crate::services::session_service::SessionService;
use crate::services::token_service::TokenService;
use crate::storage::Stores;
use std::sync::Arc;
use tokio::sync::watch;

/// Wired services, ready to be mounted on the routers.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    stores: Option<Stores>,
    pool: Option<DbPool>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, stores: None, pool: None }
    }

    /// Backs every store with `PostgreSQL` and points the readiness probe at the pool.
    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.stores = Some(adapters::database::stores(&pool));
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    /// # Errors
    /// Returns an error if no stores were provided or the bootstrap API key cannot be written.
    pub async fn build(self) -> anyhow::Result<App> {
        let stores = self.stores.ok_or_else(|| anyhow::anyhow!("no stores configured"))?;
        let tokens = TokenService::new(Arc::new(JwtCodec), &self.config.auth);

        let api_key_service = ApiKeyService::new(Arc::clone(&stores.api_keys));
        if let Some(key) = &self.config.bootstrap_api_key {
            api_key_service.ensure_basic(key).await?;
            tracing::info!("bootstrap API key ensured");
        }

        let services = ServiceContainer {
            access_service: AccessService::new(
                Arc::clone(&stores.shops),
                Arc::clone(&stores.key_tokens),
                tokens.clone(),
            ),
            session_service: SessionService::new(Arc::clone(&stores.key_tokens), Arc::clone(&stores.shops), tokens),
            discount_service: DiscountService::new(Arc::clone(&stores.discounts), Arc::clone(&stores.products)),
            cart_service: CartService::new(Arc::clone(&stores.carts), Arc::clone(&stores.products)),
            product_service: ProductService::new(Arc::clone(&stores.products)),
            api_key_service,
        };
        let health_service = HealthService::new(self.pool, self.config.database.health_timeout_ms);

        Ok(App { services, health_service })
    }
}

/// # Errors
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(panic.location = %location, panic.payload = %payload, "panic");
    }));
}
