//! Order builder coverage: trusted re-pricing, stock gating, shipping
//! policy, and guest/authenticated validation.

mod common;

use axum::http::{Method, StatusCode};
use common::{guest_cart, money, response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::json;
use storefront_api::entities::order;
use storefront_api::notifications::NotificationKind;
use uuid::Uuid;

#[tokio::test]
async fn client_prices_are_ignored_in_favor_of_catalog_prices() {
    let app = TestApp::new().await;
    let book = app.seed_product("Hardcover Atlas", dec!(300.00), true).await;
    let lamp = app.seed_product("Desk Lamp", dec!(250.00), true).await;

    // The client claims both items cost 1.00; the catalog disagrees.
    let payload = guest_cart(
        vec![
            json!({"product_id": book, "quantity": 1, "unit_price": "1.00", "title": "cheap atlas"}),
            json!({"product_id": lamp, "quantity": 1, "unit_price": "1.00"}),
        ],
        "card",
    );

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let data = &body["data"];
    assert_eq!(money(&data["subtotal"]), dec!(550.00));
    assert_eq!(money(&data["shipping_cost"]), Decimal::ZERO);
    assert_eq!(money(&data["total_amount"]), dec!(550.00));
    assert_eq!(data["status"], "processing");
    assert_eq!(data["payment_status"], "pending");
    assert_eq!(data["items"].as_array().unwrap().len(), 2);

    // Item snapshots also carry oracle prices.
    let prices: Vec<Decimal> = data["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| money(&item["unit_price"]))
        .collect();
    assert!(prices.contains(&dec!(300.00)));
    assert!(prices.contains(&dec!(250.00)));
}

#[tokio::test]
async fn totals_satisfy_the_price_invariant() {
    let app = TestApp::new().await;
    let item = app.seed_product("Notebook", dec!(120.50), true).await;

    let payload = guest_cart(vec![json!({"product_id": item, "quantity": 3})], "card");
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let order_id = Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap();
    let stored = app.load_order(order_id).await;

    assert_eq!(stored.subtotal, dec!(361.50));
    assert_eq!(stored.shipping_cost, dec!(49.90));
    assert_eq!(stored.total_amount, stored.subtotal + stored.shipping_cost);
}

#[tokio::test]
async fn shipping_threshold_is_inclusive() {
    let app = TestApp::new().await;
    let exact = app.seed_product("Exactly Enough", dec!(500.00), true).await;
    let short = app.seed_product("Just Short", dec!(499.99), true).await;

    let at_threshold = guest_cart(vec![json!({"product_id": exact, "quantity": 1})], "card");
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(at_threshold), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(money(&body["data"]["shipping_cost"]), Decimal::ZERO);
    assert_eq!(money(&body["data"]["total_amount"]), dec!(500.00));

    let below_threshold = guest_cart(vec![json!({"product_id": short, "quantity": 1})], "card");
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(below_threshold), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(money(&body["data"]["shipping_cost"]), dec!(49.90));
    assert_eq!(money(&body["data"]["total_amount"]), dec!(549.89));
}

#[tokio::test]
async fn bank_transfer_orders_start_pending() {
    let app = TestApp::new().await;
    let item = app.seed_product("Teapot", dec!(80.00), true).await;

    let payload = guest_cart(
        vec![json!({"product_id": item, "quantity": 1})],
        "bank_transfer",
    );
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["payment_method"], "bank_transfer");
}

#[tokio::test]
async fn out_of_stock_lines_reject_the_whole_order_and_name_every_title() {
    let app = TestApp::new().await;
    let available = app.seed_product("In Stock Mug", dec!(50.00), true).await;
    let gone = app.seed_product("Sold Out Poster", dec!(30.00), false).await;
    let also_gone = app.seed_product("Sold Out Frame", dec!(40.00), false).await;

    let payload = guest_cart(
        vec![
            json!({"product_id": available, "quantity": 1}),
            json!({"product_id": gone, "quantity": 1}),
            json!({"product_id": also_gone, "quantity": 2}),
        ],
        "card",
    );

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Sold Out Poster"));
    assert!(message.contains("Sold Out Frame"));
    assert!(!message.contains("In Stock Mug"));

    // No partial order was persisted.
    let orders = order::Entity::find().all(&*app.state.db).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn unknown_products_are_named_in_the_rejection() {
    let app = TestApp::new().await;
    let ghost = Uuid::new_v4();

    let payload = guest_cart(vec![json!({"product_id": ghost, "quantity": 1})], "card");
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(&ghost.to_string()));
}

#[tokio::test]
async fn guest_checkout_requires_full_contact_details() {
    let app = TestApp::new().await;
    let item = app.seed_product("Scarf", dec!(60.00), true).await;

    let mut payload = guest_cart(vec![json!({"product_id": item, "quantity": 1})], "card");
    payload["customer_phone"] = json!(null);

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn guest_checkout_rejects_malformed_emails() {
    let app = TestApp::new().await;
    let item = app.seed_product("Gloves", dec!(45.00), true).await;

    let mut payload = guest_cart(vec![json!({"product_id": item, "quantity": 1})], "card");
    payload["customer_email"] = json!("not-an-email");

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_carts_are_rejected() {
    let app = TestApp::new().await;
    let item = app.seed_product("Sticker", dec!(5.00), true).await;

    let lines: Vec<_> = (0..51)
        .map(|_| json!({"product_id": item, "quantity": 1}))
        .collect();
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(guest_cart(lines, "card")),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_payment_methods_are_rejected() {
    let app = TestApp::new().await;
    let item = app.seed_product("Vase", dec!(75.00), true).await;

    let payload = guest_cart(vec![json!({"product_id": item, "quantity": 1})], "paypal");
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn authenticated_checkout_uses_saved_address_and_profile() {
    let app = TestApp::new().await;
    let customer_id = Uuid::new_v4();
    let address_id = Uuid::new_v4();
    app.directory
        .register_customer(customer_id, "Mehmet Kaya", "mehmet@example.com", "+905551110000");
    app.directory.register_address(customer_id, address_id, "Ankara");

    let item = app.seed_product("Backpack", dec!(350.00), true).await;
    let payload = json!({
        "lines": [{"product_id": item, "quantity": 1}],
        "saved_address_id": address_id,
        "payment_method": "card"
    });

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(payload),
            Some((customer_id, "customer")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["data"]["customer_id"], customer_id.to_string());
    assert_eq!(body["data"]["customer_email"], "mehmet@example.com");
    assert!(body["data"]["shipping_address"]
        .as_str()
        .unwrap()
        .contains("Ankara"));
}

#[tokio::test]
async fn order_numbers_are_unique_and_well_formed() {
    let app = TestApp::new().await;
    let item = app.seed_product("Candle", dec!(25.00), true).await;

    let mut numbers = Vec::new();
    for _ in 0..5 {
        let payload = guest_cart(vec![json!({"product_id": item, "quantity": 1})], "card");
        let response = app
            .request(Method::POST, "/api/v1/orders", Some(payload), None)
            .await;
        let body = response_json(response).await;
        numbers.push(body["data"]["order_number"].as_str().unwrap().to_string());
    }

    for number in &numbers {
        assert!(number.starts_with("SF-"), "unexpected format: {}", number);
    }
    let unique: std::collections::HashSet<_> = numbers.iter().collect();
    assert_eq!(unique.len(), numbers.len());
}

#[tokio::test]
async fn order_creation_dispatches_a_confirmation_notification() {
    let app = TestApp::new().await;
    let item = app.seed_product("Mug", dec!(35.00), true).await;

    let payload = guest_cart(vec![json!({"product_id": item, "quantity": 1})], "card");
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let sent = app.wait_for_notifications(1).await;
    assert_eq!(sent[0].kind, NotificationKind::OrderPlaced);
    assert_eq!(sent[0].recipient, "ayse@example.com");
}
