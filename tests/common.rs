#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use clap::Parser;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Once;
use storefront_server::api::{self, MgmtState};
use storefront_server::config::Config;
use storefront_server::adapters::database::DbPool;
use storefront_server::storage::Stores;
use storefront_server::{AppBuilder, adapters};
use tower::ServiceExt;
use uuid::Uuid;

pub const API_KEY: &str = "integration-test-key";

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("storefront_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Connects to `DATABASE_URL` and applies migrations. `None` when the variable is unset.
pub async fn get_test_pool() -> Option<DbPool> {
    setup_tracing();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, skipping Postgres-backed test");
        return None;
    };

    let config = Config::parse_from(["storefront-server", "--database-url", &database_url]);
    let pool = adapters::database::init_pool(&config.database).await.expect("Failed to connect to DB. Is Postgres running?");
    storefront_server::run_migrations(&pool).await.expect("Failed to run migrations");

    Some(pool)
}

pub fn get_test_config() -> Config {
    Config::parse_from(["storefront-server", "--in-memory", "--bootstrap-api-key", API_KEY])
}

/// Credentials of a shop that signed up through the API.
#[derive(Debug, Clone)]
pub struct ShopSession {
    pub shop_id: Uuid,
    pub client_id: String,
    pub email: String,
    pub access_token: String,
    pub bearer: String,
    pub refresh_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub mgmt: Router,
    pub stores: Stores,
}

impl TestApp {
    pub async fn spawn() -> Self {
        setup_tracing();
        let config = get_test_config();
        let stores = adapters::memory::stores();
        let app = AppBuilder::new(config.clone()).with_stores(stores.clone()).build().await.unwrap();

        Self {
            router: api::app_router(&config, app.services),
            mgmt: api::mgmt_router(MgmtState { health_service: app.health_service }),
            stores,
        }
    }

    /// Sends a request carrying the bootstrap API key.
    pub async fn send(&self, method: Method, path: &str, headers: &[(&str, &str)], body: Option<Value>) -> (StatusCode, Value) {
        let mut all_headers = vec![("x-api-key", API_KEY)];
        all_headers.extend_from_slice(headers);
        self.send_raw(&self.router, method, path, &all_headers, body).await
    }

    pub async fn send_raw(
        &self,
        router: &Router,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn sign_up(&self, name: &str) -> ShopSession {
        let email = format!("{name}-{}@example.com", &Uuid::new_v4().to_string()[..8]);
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/api/shop/signup",
                &[],
                Some(json!({ "name": name, "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        session_from(&body["metadata"], email)
    }

    pub async fn create_product(&self, shop: &ShopSession, name: &str, price: i64) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/api/product",
                &shop.access_headers(),
                Some(json!({
                    "name": name,
                    "thumb": "thumb.png",
                    "description": format!("{name} for everyday use"),
                    "price": price,
                    "quantity": 10,
                    "productType": "Electronics",
                    "productAttributes": { "manufacturer": "Acme", "model": "X1" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["metadata"].clone()
    }

    pub async fn publish(&self, shop: &ShopSession, product_id: &str) {
        let (status, body) = self
            .send(Method::POST, &format!("/v1/api/product/publish/{product_id}"), &shop.access_headers(), None)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

pub fn session_from(metadata: &Value, email: String) -> ShopSession {
    let shop_id: Uuid = metadata["shop"]["_id"].as_str().unwrap().parse().unwrap();
    let access_token = metadata["tokens"]["accessToken"].as_str().unwrap().to_string();
    ShopSession {
        shop_id,
        client_id: shop_id.to_string(),
        email,
        bearer: format!("Bearer {access_token}"),
        access_token,
        refresh_token: metadata["tokens"]["refreshToken"].as_str().unwrap().to_string(),
    }
}

impl ShopSession {
    pub fn access_headers(&self) -> [(&'static str, &str); 2] {
        [("x-client-id", self.client_id.as_str()), ("authorization", self.bearer.as_str())]
    }

    pub fn refresh_headers(&self) -> [(&'static str, &str); 2] {
        [("x-client-id", self.client_id.as_str()), ("x-rtoken-id", self.refresh_token.as_str())]
    }
}
