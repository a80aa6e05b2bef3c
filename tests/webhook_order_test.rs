mod common;

use axum::{body::Body, http::Request};
use common::{sign_webhook_payload, TestApp, TEST_WEBHOOK_SECRET};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use yoa_api::entities::{artwork, order, order_item, Order, OrderItem};

fn succeeded_event(payment_intent_id: &str, painting: &artwork::Model) -> Vec<u8> {
    let cart = json!([{
        "artwork_id": painting.id,
        "title": painting.title,
        "price": "450.00",
        "quantity": 1,
        "slug": painting.slug,
    }]);
    json!({
        "id": format!("evt_{payment_intent_id}"),
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": payment_intent_id,
                "metadata": {
                    "order_number": "YOA-20260830-0042",
                    "customer_name": "A Collector",
                    "customer_email": "collector@example.com",
                    "shipping_address": "1 Main St, Town, 00000, US",
                    "billing_address": "1 Main St, Town, 00000, US",
                    "cart": cart.to_string(),
                    "subtotal": "450.00",
                    "shipping_cost": "15.00",
                    "tax_amount": "0.00",
                    "total": "465.00"
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

async fn deliver(app: &TestApp, payload: &[u8], signature: &str) -> u16 {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/payments")
        .header("content-type", "application/json")
        .header("Stripe-Signature", signature)
        .body(Body::from(payload.to_vec()))
        .expect("request should build");
    app.request(request).await.status().as_u16()
}

#[tokio::test]
async fn succeeded_event_materializes_a_paid_order() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;

    let payload = succeeded_event("pi_test_1", &painting);
    let signature = sign_webhook_payload(&payload, TEST_WEBHOOK_SECRET);
    assert_eq!(deliver(&app, &payload, &signature).await, 200);

    let orders = Order::find().all(&*app.state.db).await.unwrap();
    assert_eq!(orders.len(), 1);
    let created = &orders[0];
    assert_eq!(created.status, order::OrderStatus::Paid);
    assert_eq!(created.payment_intent_id, "pi_test_1");
    assert_eq!(created.order_number, "YOA-20260830-0042");
    assert_eq!(created.subtotal, dec!(450.00));
    assert_eq!(created.total, dec!(465.00));

    // Line items are the snapshot from the intent, not a re-fetch
    let items = OrderItem::find().all(&*app.state.db).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Harbor at Dusk");
    assert_eq!(items[0].unit_price, dec!(450.00));
    assert_eq!(items[0].line_total, dec!(450.00));

    // Sold inventory is decremented
    let refreshed = artwork::Entity::find_by_id(painting.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.inventory_count, 2);
}

#[tokio::test]
async fn redelivered_event_does_not_create_a_second_order() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;

    let payload = succeeded_event("pi_test_dup", &painting);

    for _ in 0..2 {
        let signature = sign_webhook_payload(&payload, TEST_WEBHOOK_SECRET);
        assert_eq!(deliver(&app, &payload, &signature).await, 200);
    }

    let order_count = Order::find().count(&*app.state.db).await.unwrap();
    assert_eq!(order_count, 1);
    let item_count = order_item::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(item_count, 1);

    // Inventory comes off exactly once too
    let refreshed = artwork::Entity::find_by_id(painting.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.inventory_count, 2);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_processing() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;

    let payload = succeeded_event("pi_test_bad", &painting);
    let signature = sign_webhook_payload(&payload, "some_other_secret");
    assert_eq!(deliver(&app, &payload, &signature).await, 401);

    let order_count = Order::find().count(&*app.state.db).await.unwrap();
    assert_eq!(order_count, 0);
}

#[tokio::test]
async fn missing_signature_header_is_unauthorized() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/payments")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .expect("request should build");
    let response = app.request(request).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn unrelated_event_types_are_acknowledged_and_skipped() {
    let app = TestApp::new().await;

    let payload = json!({
        "id": "evt_other",
        "type": "payment_intent.created",
        "data": { "object": { "id": "pi_x" } }
    })
    .to_string()
    .into_bytes();
    let signature = sign_webhook_payload(&payload, TEST_WEBHOOK_SECRET);
    assert_eq!(deliver(&app, &payload, &signature).await, 200);

    let order_count = Order::find().count(&*app.state.db).await.unwrap();
    assert_eq!(order_count, 0);
}
