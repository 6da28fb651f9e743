use crate::config::Config;
use crate::services::access_service::AccessService;
use crate::services::api_key_service::ApiKeyService;
use crate::services::cart_service::CartService;
use crate::services::discount_service::DiscountService;
use crate::services::health_service::HealthService;
use crate::services::product_service::ProductService;
use crate::services::session_service::SessionService;
use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use std::time::Duration;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod access;
pub mod cart;
pub mod discount;
pub mod health;
pub mod middleware;
pub mod product;
pub mod response;
pub mod schemas;

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub access_service: AccessService,
    pub session_service: SessionService,
    pub discount_service: DiscountService,
    pub cart_service: CartService,
    pub product_service: ProductService,
    pub api_key_service: ApiKeyService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub access_service: AccessService,
    pub session_service: SessionService,
    pub discount_service: DiscountService,
    pub cart_service: CartService,
    pub product_service: ProductService,
    pub api_key_service: ApiKeyService,
}

async fn welcome() -> &'static str {
    "Welcome to my world"
}

fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/signup", post(access::sign_up))
        .route("/shop/login", post(access::login))
        .route("/shop/logout", post(access::logout))
        .route("/shop/refresh-token", post(access::refresh_token))
}

fn discount_routes() -> Router<AppState> {
    Router::new()
        .route("/discount/amount", post(discount::get_discount_amount))
        .route("/discount/products", get(discount::list_products_for_code))
        .route("/discount/redeem", post(discount::redeem))
        .route("/discount/cancel", post(discount::cancel))
        .route("/discount", post(discount::create).get(discount::list_for_shop))
        // PATCH takes the code id, DELETE the code itself.
        .route("/discount/{key}", patch(discount::update).delete(discount::delete))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", post(cart::add).get(cart::get).delete(cart::delete_item))
        .route("/cart/update", post(cart::update))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/product/search/{key}", get(product::search))
        .route("/product/drafts", get(product::drafts))
        .route("/product/published", get(product::published))
        .route("/product/publish/{id}", post(product::publish))
        .route("/product/unpublish/{id}", post(product::unpublish))
        .route("/product", get(product::find_all).post(product::create))
        .route("/product/{id}", get(product::find_one).patch(product::update))
}

/// Configures and returns the primary application router.
pub fn app_router(config: &Config, services: ServiceContainer) -> Router {
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    let state = AppState {
        access_service: services.access_service,
        session_service: services.session_service,
        discount_service: services.discount_service,
        cart_service: services.cart_service,
        product_service: services.product_service,
        api_key_service: services.api_key_service,
    };

    let api_routes = shop_routes()
        .merge(discount_routes())
        .merge(cart_routes())
        .merge(product_routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    Router::new()
        .route("/", get(welcome))
        .nest("/v1/api", api_routes)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                    let status = response.status();
                    span.record("http.response.status_code", status.as_u16());

                    tracing::info!(
                        latency_ms = %latency.as_millis(),
                        status = %status.as_u16(),
                        "request completed"
                    );
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID), MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
