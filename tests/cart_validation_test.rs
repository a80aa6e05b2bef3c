mod common;

use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use yoa_api::services::cart::CartLine;

fn line(artwork: &yoa_api::entities::artwork::Model, quantity: i32) -> CartLine {
    CartLine {
        artwork_id: artwork.id,
        title: artwork.title.clone(),
        price: artwork.price,
        quantity,
        slug: artwork.slug.clone(),
    }
}

#[tokio::test]
async fn valid_cart_is_repriced_from_the_store() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;
    let print = app
        .insert_artwork("Dune Study", "dune-study", dec!(120.50), 10, true)
        .await;

    let cart = app
        .state
        .services
        .cart
        .validate_cart(&[line(&painting, 1), line(&print, 2)])
        .await;

    assert!(cart.is_valid, "errors: {:?}", cart.errors);
    assert!(cart.errors.is_empty());
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.subtotal, dec!(691.00));
    assert_eq!(cart.shipping_cost, app.state.config.shipping_cost());
    assert_eq!(cart.tax_amount, Decimal::ZERO);
    assert_eq!(
        cart.total,
        cart.subtotal + cart.shipping_cost + cart.tax_amount
    );
}

#[tokio::test]
async fn tampered_price_is_rejected_with_refresh_message() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;

    let mut tampered = line(&painting, 1);
    tampered.price = dec!(1.00);

    let cart = app.state.services.cart.validate_cart(&[tampered]).await;

    assert!(!cart.is_valid);
    assert_eq!(
        cart.errors,
        vec!["Price for \"Harbor at Dusk\" has changed. Please refresh your cart.".to_string()]
    );
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn all_failures_are_reported_per_line() {
    let app = TestApp::new().await;
    let unpublished = app
        .insert_artwork("Hidden Work", "hidden-work", dec!(200.00), 5, false)
        .await;
    let low_stock = app
        .insert_artwork("Small Series", "small-series", dec!(75.25), 2, true)
        .await;

    let missing = CartLine {
        artwork_id: Uuid::new_v4(),
        title: "Ghost".to_string(),
        price: dec!(10.00),
        quantity: 1,
        slug: "ghost".to_string(),
    };

    let cart = app
        .state
        .services
        .cart
        .validate_cart(&[missing, line(&unpublished, 1), line(&low_stock, 3)])
        .await;

    assert!(!cart.is_valid);
    assert_eq!(cart.errors.len(), 3);
    assert!(cart.errors.contains(&"Item \"Ghost\" not found".to_string()));
    assert!(cart
        .errors
        .contains(&"Item \"Hidden Work\" is no longer available".to_string()));
    assert!(cart
        .errors
        .contains(&"Only 2 of \"Small Series\" available".to_string()));
}

#[tokio::test]
async fn quantity_equal_to_inventory_passes() {
    let app = TestApp::new().await;
    let low_stock = app
        .insert_artwork("Small Series", "small-series", dec!(75.25), 2, true)
        .await;

    let cart = app
        .state
        .services
        .cart
        .validate_cart(&[line(&low_stock, 2)])
        .await;

    assert!(cart.is_valid, "errors: {:?}", cart.errors);
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn validation_is_idempotent_while_state_is_unchanged() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;
    let lines = [line(&painting, 1)];

    let first = app.state.services.cart.validate_cart(&lines).await;
    let second = app.state.services.cart.validate_cart(&lines).await;

    assert_eq!(first.is_valid, second.is_valid);
    assert_eq!(first.subtotal, second.subtotal);
    assert_eq!(first.total, second.total);
    assert_eq!(first.errors, second.errors);
}

#[tokio::test]
async fn empty_cart_zeroes_totals() {
    let app = TestApp::new().await;

    let cart = app.state.services.cart.validate_cart(&[]).await;

    assert!(!cart.is_valid);
    assert_eq!(cart.errors, vec!["Cart is empty".to_string()]);
    assert_eq!(cart.subtotal, Decimal::ZERO);
    assert_eq!(cart.shipping_cost, Decimal::ZERO);
    assert_eq!(cart.total, Decimal::ZERO);
}

#[tokio::test]
async fn validate_endpoint_returns_full_report() {
    let app = TestApp::new().await;
    let painting = app
        .insert_artwork("Harbor at Dusk", "harbor-at-dusk", dec!(450.00), 3, true)
        .await;

    let (status, body) = app
        .post_json(
            "/api/v1/cart/validate",
            &json!([{
                "artwork_id": painting.id,
                "title": "Harbor at Dusk",
                "price": "450.00",
                "quantity": 1,
                "slug": "harbor-at-dusk"
            }]),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["is_valid"], json!(true));
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
}
