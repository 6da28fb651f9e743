#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::clone_on_ref_ptr, unreachable_pub)]
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;
mod common;

fn line(product: &Value, quantity: i64) -> Value {
    json!({
        "productId": product["id"],
        "shopId": product["shopId"],
        "name": product["name"],
        "price": product["price"],
        "quantity": quantity
    })
}

fn quantity_of(cart: &Value, product: &Value) -> Option<i64> {
    cart["products"].as_array().unwrap().iter().find(|p| p["productId"] == product["id"]).map(|p| p["quantity"].as_i64().unwrap())
}

#[tokio::test]
async fn test_add_merges_lines() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Lamps").await;
    let lamp = app.create_product(&shop, "Lamp", 40).await;
    let user_id = Uuid::new_v4();

    let (status, body) =
        app.send(Method::POST, "/v1/api/cart", &[], Some(json!({ "userId": user_id, "product": line(&lamp, 1) }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["metadata"]["state"], "active");

    let (_, body) =
        app.send(Method::POST, "/v1/api/cart", &[], Some(json!({ "userId": user_id, "product": line(&lamp, 2) }))).await;
    assert_eq!(body["metadata"]["countProducts"], 1);
    assert_eq!(quantity_of(&body["metadata"], &lamp), Some(3));

    let (status, _) =
        app.send(Method::POST, "/v1/api/cart", &[], Some(json!({ "userId": user_id, "product": line(&lamp, 0) }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::GET, &format!("/v1/api/cart?userId={user_id}"), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantity_of(&body["metadata"], &lamp), Some(3));
}

#[tokio::test]
async fn test_update_quantities() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Chairs").await;
    let chair = app.create_product(&shop, "Chair", 90).await;
    let user_id = Uuid::new_v4();
    app.send(Method::POST, "/v1/api/cart", &[], Some(json!({ "userId": user_id, "product": line(&chair, 2) }))).await;

    let update = |quantity: i64, old_quantity: i64, shop_id: &str| {
        json!({
            "userId": user_id,
            "shopOrderIds": [{
                "shopId": shop_id,
                "itemProducts": [{ "productId": chair["id"], "quantity": quantity, "oldQuantity": old_quantity }]
            }]
        })
    };
    let shop_id = shop.client_id.as_str();

    let (status, body) = app.send(Method::POST, "/v1/api/cart/update", &[], Some(update(5, 2, shop_id))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(quantity_of(&body["metadata"], &chair), Some(5));

    let other_shop = Uuid::new_v4().to_string();
    let (status, body) = app.send(Method::POST, "/v1/api/cart/update", &[], Some(update(1, 5, &other_shop))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "product do not belong to this shop");

    let (status, body) = app.send(Method::POST, "/v1/api/cart/update", &[], Some(update(0, 5, shop_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantity_of(&body["metadata"], &chair), None);

    // A product missing from the cart is added with the requested quantity.
    let (_, body) = app.send(Method::POST, "/v1/api/cart/update", &[], Some(update(4, 0, shop_id))).await;
    assert_eq!(quantity_of(&body["metadata"], &chair), Some(4));

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/api/cart/update",
            &[],
            Some(json!({ "userId": user_id, "shopOrderIds": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_unknown_product() {
    let app = common::TestApp::spawn().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/api/cart/update",
            &[],
            Some(json!({
                "userId": Uuid::new_v4(),
                "shopOrderIds": [{
                    "shopId": Uuid::new_v4(),
                    "itemProducts": [{ "productId": Uuid::new_v4(), "quantity": 1, "oldQuantity": 0 }]
                }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "not found product");
}

#[tokio::test]
async fn test_delete_item() {
    let app = common::TestApp::spawn().await;
    let shop = app.sign_up("Rugs").await;
    let rug = app.create_product(&shop, "Rug", 120).await;
    let user_id = Uuid::new_v4();
    app.send(Method::POST, "/v1/api/cart", &[], Some(json!({ "userId": user_id, "product": line(&rug, 1) }))).await;

    let delete = json!({ "userId": user_id, "productId": rug["id"] });
    let (status, body) = app.send(Method::DELETE, "/v1/api/cart", &[], Some(delete.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["deleted"], true);

    let (_, body) = app.send(Method::DELETE, "/v1/api/cart", &[], Some(delete)).await;
    assert_eq!(body["metadata"]["deleted"], false);

    let (_, body) = app.send(Method::GET, &format!("/v1/api/cart?userId={user_id}"), &[], None).await;
    assert_eq!(body["metadata"]["countProducts"], 0);
}
