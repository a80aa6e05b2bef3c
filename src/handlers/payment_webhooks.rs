use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use tracing::{info, instrument, warn};

use crate::{
    errors::ServiceError,
    events::Event,
    services::cart::CartLine,
    services::orders::{NewOrder, NewOrderItem},
    services::payments::WebhookEvent,
    AppState,
};

const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Payment processor webhook
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payments",
    summary = "Payment webhook",
    description = "Receives payment events. The signature is verified against the raw body \
                   before anything in the payload is trusted. Order creation is idempotent \
                   on the payment intent id, so redelivered events are safe.",
    request_body(content = Vec<u8>, content_type = "application/json", description = "Raw webhook payload"),
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Payload missing required metadata", body = crate::errors::ErrorResponse),
        (status = 401, description = "Signature verification failed", body = crate::errors::ErrorResponse),
    )
)]
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ServiceError::Unauthorized("missing webhook signature header".to_string())
        })?;

    // Nothing in the body is trusted until this succeeds.
    let event = state.services.stripe.verify_webhook_event(&body, signature)?;

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let order = materialize_order(&state, &event).await?;
            info!(
                event_id = %event.id,
                order_id = %order.id,
                order_number = %order.order_number,
                "payment succeeded; order materialized"
            );
            Ok((
                StatusCode::OK,
                Json(json!({ "received": true, "order_number": order.order_number })),
            ))
        }
        other => {
            // Acknowledged so the processor stops redelivering.
            info!(event_id = %event.id, event_type = other, "ignoring webhook event type");
            Ok((StatusCode::OK, Json(json!({ "received": true }))))
        }
    }
}

/// Rebuilds the order from the intent metadata written at checkout time.
async fn materialize_order(
    state: &AppState,
    event: &WebhookEvent,
) -> Result<crate::entities::order::Model, ServiceError> {
    let object = &event.data["object"];
    let payment_intent_id = object["id"]
        .as_str()
        .ok_or_else(|| {
            ServiceError::BadRequest("webhook payload has no payment intent id".to_string())
        })?
        .to_string();
    let metadata = &object["metadata"];

    let cart_json = metadata_str(metadata, "cart")?;
    let lines: Vec<CartLine> = serde_json::from_str(&cart_json).map_err(|err| {
        ServiceError::BadRequest(format!("unreadable cart snapshot in intent metadata: {err}"))
    })?;
    if lines.is_empty() {
        warn!(%payment_intent_id, "payment intent carries an empty cart snapshot");
        return Err(ServiceError::BadRequest(
            "payment intent carries an empty cart snapshot".to_string(),
        ));
    }

    let new_order = NewOrder {
        payment_intent_id: payment_intent_id.clone(),
        order_number: metadata_str(metadata, "order_number")?,
        customer_name: metadata_str(metadata, "customer_name")?,
        customer_email: metadata_str(metadata, "customer_email")?,
        shipping_address: metadata_str(metadata, "shipping_address")?,
        billing_address: metadata_str(metadata, "billing_address")?,
        subtotal: metadata_decimal(metadata, "subtotal")?,
        shipping_cost: metadata_decimal(metadata, "shipping_cost")?,
        tax_amount: metadata_decimal(metadata, "tax_amount")?,
        total: metadata_decimal(metadata, "total")?,
        items: lines
            .into_iter()
            .map(|line| NewOrderItem {
                artwork_id: line.artwork_id,
                title: line.title,
                slug: line.slug,
                unit_price: line.price,
                quantity: line.quantity,
            })
            .collect(),
    };

    let order = state
        .services
        .orders
        .create_from_payment_intent(new_order)
        .await?;

    state
        .event_sender
        .send_or_log(Event::PaymentSucceeded { payment_intent_id })
        .await;

    Ok(order)
}

fn metadata_str(metadata: &serde_json::Value, key: &str) -> Result<String, ServiceError> {
    metadata[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ServiceError::BadRequest(format!("intent metadata is missing \"{key}\"")))
}

fn metadata_decimal(metadata: &serde_json::Value, key: &str) -> Result<Decimal, ServiceError> {
    let raw = metadata_str(metadata, key)?;
    Decimal::from_str(&raw).map_err(|_| {
        ServiceError::BadRequest(format!("intent metadata \"{key}\" is not a valid amount"))
    })
}
