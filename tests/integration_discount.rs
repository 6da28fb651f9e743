#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::clone_on_ref_ptr, unreachable_pub)]
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
mod common;

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap()
}

fn discount_payload(code: &str) -> Value {
    let now = OffsetDateTime::now_utc();
    json!({
        "name": "Spring sale",
        "description": "Ten off",
        "code": code,
        "type": "fixed_amount",
        "value": 10,
        "minOrderValue": 50,
        "startDate": rfc3339(now - Duration::days(1)),
        "endDate": rfc3339(now + Duration::days(7)),
        "maxUses": 2,
        "maxUsesPerUser": 1,
        "appliesTo": "all"
    })
}

async fn create_code(app: &common::TestApp, shop: &common::ShopSession, payload: Value) -> (StatusCode, Value) {
    app.send(Method::POST, "/v1/api/discount", &shop.access_headers(), Some(payload)).await
}

#[tokio::test]
async fn test_create_and_list_codes() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Codes").await;

    let (status, body) = create_code(&app, &shop, discount_payload("SPRING")).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["metadata"]["code"], "SPRING");
    assert_eq!(body["metadata"]["shopId"], shop.client_id);

    let (status, body) = create_code(&app, &shop, discount_payload("SPRING")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Discount exists!");

    let mut bad_dates = discount_payload("BACKWARDS");
    bad_dates["endDate"] = bad_dates["startDate"].clone();
    let (status, _) = create_code(&app, &shop, bad_dates).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_percentage = discount_payload("TOOMUCH");
    bad_percentage["type"] = json!("percentage");
    bad_percentage["value"] = json!(150);
    let (status, _) = create_code(&app, &shop, bad_percentage).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::GET, "/v1/api/discount?limit=10&page=1", &shop.access_headers(), None).await;
    assert_eq!(status, StatusCode::OK);
    let codes = body["metadata"].as_array().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0]["code"], "SPRING");

    let far_page = format!("/v1/api/discount?limit=200&page={}", i64::MAX);
    let (status, body) = app.send(Method::GET, &far_page, &shop.access_headers(), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["metadata"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_discount_amount() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Pricing").await;
    create_code(&app, &shop, discount_payload("TENOFF")).await;
    let product_id = Uuid::new_v4();

    let amount = |quantity: i64| {
        json!({
            "codeId": "TENOFF",
            "shopId": shop.shop_id,
            "userId": Uuid::new_v4(),
            "products": [{ "productId": product_id, "quantity": quantity, "price": 20 }]
        })
    };

    let (status, body) = app.send(Method::POST, "/v1/api/discount/amount", &[], Some(amount(3))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["metadata"]["orderTotal"], 60);
    assert_eq!(body["metadata"]["discountAmount"], 10);
    assert_eq!(body["metadata"]["finalTotal"], 50);

    let (status, body) = app.send(Method::POST, "/v1/api/discount/amount", &[], Some(amount(1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Discount requires a minimum order value of 50");

    let mut unknown = amount(3);
    unknown["codeId"] = json!("NOPE");
    let (status, body) = app.send(Method::POST, "/v1/api/discount/amount", &[], Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Discount is not exists!");
}

#[tokio::test]
async fn test_redeem_and_cancel() {
    let app = common::TestApp::spawn().await;
    let owner = app.sign_up("Owner").await;
    let buyer = app.sign_up("Buyer").await;
    create_code(&app, &owner, discount_payload("ONCE")).await;
    let code_ref = json!({ "codeId": "ONCE", "shopId": owner.shop_id });

    let (status, body) =
        app.send(Method::POST, "/v1/api/discount/redeem", &buyer.access_headers(), Some(code_ref.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["metadata"]["maxUses"], 1);
    assert_eq!(body["metadata"]["usesCount"], 1);
    assert_eq!(body["metadata"]["usersUsed"][&buyer.client_id], 1);

    let (status, body) =
        app.send(Method::POST, "/v1/api/discount/redeem", &buyer.access_headers(), Some(code_ref.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Discount has reached the maximum uses for this user");

    let (status, body) =
        app.send(Method::POST, "/v1/api/discount/cancel", &buyer.access_headers(), Some(code_ref.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["metadata"]["maxUses"], 2);
    assert_eq!(body["metadata"]["usesCount"], 0);
    assert!(body["metadata"]["usersUsed"].get(&buyer.client_id).is_none());

    let (status, _) =
        app.send(Method::POST, "/v1/api/discount/cancel", &buyer.access_headers(), Some(code_ref)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redeem_requires_session() {
    let app = common::TestApp::spawn().await;
    let owner = app.sign_up("Owner").await;
    create_code(&app, &owner, discount_payload("AUTH")).await;

    let (status, _) = app
        .send(Method::POST, "/v1/api/discount/redeem", &[], Some(json!({ "codeId": "AUTH", "shopId": owner.shop_id })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Editor").await;
    let other = app.sign_up("Other").await;
    let (_, body) = create_code(&app, &shop, discount_payload("EDIT")).await;
    let id = body["metadata"]["id"].as_str().unwrap().to_string();
    let path = format!("/v1/api/discount/{id}");

    let (status, body) = app
        .send(Method::PATCH, &path, &shop.access_headers(), Some(json!({ "name": "Renamed", "value": 15 })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["metadata"]["name"], "Renamed");
    assert_eq!(body["metadata"]["value"], 15);
    assert_eq!(body["metadata"]["code"], "EDIT");

    let now = OffsetDateTime::now_utc();
    let expired = json!({ "startDate": rfc3339(now - Duration::days(3)), "endDate": rfc3339(now - Duration::days(1)) });
    let (status, body) = app.send(Method::PATCH, &path, &shop.access_headers(), Some(expired)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Discount code has expired");

    let (status, _) = app.send(Method::PATCH, &path, &other.access_headers(), Some(json!({ "value": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/v1/api/discount/{}", Uuid::new_v4());
    let (status, _) = app.send(Method::PATCH, &missing, &shop.access_headers(), Some(json!({ "value": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, "/v1/api/discount/EDIT", &other.access_headers(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::DELETE, "/v1/api/discount/EDIT", &shop.access_headers(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["code"], "EDIT");

    let (_, body) = app.send(Method::GET, "/v1/api/discount", &shop.access_headers(), None).await;
    assert!(body["metadata"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_products_for_specific_code() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Catalog").await;
    let phone = app.create_product(&shop, "Phone", 300).await;
    let tablet = app.create_product(&shop, "Tablet", 500).await;
    let phone_id = phone["id"].as_str().unwrap();
    app.publish(&shop, phone_id).await;
    app.publish(&shop, tablet["id"].as_str().unwrap()).await;

    let mut specific = discount_payload("PHONES");
    specific["appliesTo"] = json!("specific");
    specific["productIds"] = json!([phone_id]);
    create_code(&app, &shop, specific).await;
    create_code(&app, &shop, discount_payload("EVERYTHING")).await;

    let path = format!("/v1/api/discount/products?code=PHONES&shopId={}", shop.shop_id);
    let (status, body) = app.send(Method::GET, &path, &[], None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let products = body["metadata"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], phone_id);

    let path = format!("/v1/api/discount/products?code=EVERYTHING&shopId={}&limit=10&page=1", shop.shop_id);
    let (_, body) = app.send(Method::GET, &path, &[], None).await;
    assert_eq!(body["metadata"].as_array().unwrap().len(), 2);

    let path = format!("/v1/api/discount/products?code=MISSING&shopId={}", shop.shop_id);
    let (status, _) = app.send(Method::GET, &path, &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_redemptions_respect_max_uses() {
    let app = common::TestApp::spawn().await;
    let owner = app.sign_up("Busy").await;
    let mut payload = discount_payload("RUSH");
    payload["maxUses"] = json!(3);
    payload["maxUsesPerUser"] = json!(0);
    create_code(&app, &owner, payload).await;

    let mut buyers = Vec::new();
    for i in 0..8 {
        buyers.push(app.sign_up(&format!("buyer{i}")).await);
    }
    let code_ref = json!({ "codeId": "RUSH", "shopId": owner.shop_id });

    let headers: Vec<_> = buyers.iter().map(common::ShopSession::access_headers).collect();
    let results = futures::future::join_all(
        headers.iter().map(|h| app.send(Method::POST, "/v1/api/discount/redeem", h, Some(code_ref.clone()))),
    )
    .await;

    let succeeded = results.iter().filter(|(status, _)| *status == StatusCode::OK).count();
    assert_eq!(succeeded, 3);
    assert!(results.iter().filter(|(status, _)| *status != StatusCode::OK).all(|(status, body)| {
        *status == StatusCode::NOT_FOUND && body["message"] == "Discount is exhausted"
    }));
}
