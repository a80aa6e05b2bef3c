use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::Event,
    services::cart::CartLine,
    AppState,
};

/// Postal address as submitted at checkout. Stored on the order as a single
/// formatted string; no per-field address queries exist.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Address {
    #[validate(length(min = 1, message = "Street address is required"))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 2, message = "Country is required"))]
    pub country: String,
}

impl Address {
    pub fn formatted(&self) -> String {
        let mut parts = vec![self.line1.clone()];
        if let Some(line2) = &self.line2 {
            if !line2.trim().is_empty() {
                parts.push(line2.clone());
            }
        }
        parts.push(self.city.clone());
        if let Some(state) = &self.state {
            if !state.trim().is_empty() {
                parts.push(state.clone());
            }
        }
        parts.push(self.postal_code.clone());
        parts.push(self.country.clone());
        parts.join(", ")
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub customer_name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub customer_email: String,
    #[validate]
    pub shipping_address: Address,
    /// Defaults to the shipping address when absent.
    #[validate]
    pub billing_address: Option<Address>,
    pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub client_secret: String,
    pub order_number: String,
}

/// Initiate checkout
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    summary = "Initiate checkout",
    description = "Validates and re-prices the submitted cart, then creates a payment intent. \
                   No order row is created here; orders materialize from the payment webhook.",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CheckoutResponse),
        (status = 400, description = "Cart failed validation"),
        (status = 402, description = "Payment intent creation failed", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment service unavailable", body = crate::errors::ErrorResponse),
    )
)]
#[instrument(skip(state, request), fields(item_count = request.items.len()))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let validated = state.services.cart.validate_cart(&request.items).await;
    if !validated.is_valid {
        // The storefront surfaces one error at a time.
        let first = validated
            .errors
            .first()
            .cloned()
            .unwrap_or_else(|| "Cart is empty".to_string());
        return Ok((StatusCode::BAD_REQUEST, Json(json!({ "error": first }))).into_response());
    }

    let order_number = crate::services::payments::generate_order_number();
    let shipping_address = request.shipping_address.formatted();
    let billing_address = request
        .billing_address
        .as_ref()
        .map(Address::formatted)
        .unwrap_or_else(|| shipping_address.clone());

    // Everything the webhook needs to materialize the order rides on the
    // intent; nothing is trusted from the client at webhook time.
    let cart_json = serde_json::to_string(&validated.items)
        .map_err(|err| ServiceError::InternalError(err.to_string()))?;
    let mut metadata = HashMap::new();
    metadata.insert("order_number".to_string(), order_number.clone());
    metadata.insert("customer_name".to_string(), request.customer_name);
    metadata.insert("customer_email".to_string(), request.customer_email);
    metadata.insert("shipping_address".to_string(), shipping_address);
    metadata.insert("billing_address".to_string(), billing_address);
    metadata.insert("cart".to_string(), cart_json);
    metadata.insert("subtotal".to_string(), validated.subtotal.to_string());
    metadata.insert(
        "shipping_cost".to_string(),
        validated.shipping_cost.to_string(),
    );
    metadata.insert("tax_amount".to_string(), validated.tax_amount.to_string());
    metadata.insert("total".to_string(), validated.total.to_string());

    let intent = state
        .services
        .stripe
        .create_payment_intent(validated.total, &state.config.currency, &metadata)
        .await?;

    info!(
        payment_intent_id = %intent.id,
        %order_number,
        amount_minor = intent.amount,
        "payment intent created"
    );
    state
        .event_sender
        .send_or_log(Event::PaymentIntentCreated {
            payment_intent_id: intent.id,
            order_number: order_number.clone(),
        })
        .await;

    Ok(Json(CheckoutResponse {
        client_secret: intent.client_secret,
        order_number,
    })
    .into_response())
}

/// Validate a cart without starting payment
#[utoipa::path(
    post,
    path = "/api/v1/cart/validate",
    summary = "Validate cart",
    description = "Re-prices the submitted cart against the catalog and reports all problems.",
    responses(
        (status = 200, description = "Validation result", body = crate::services::cart::ValidatedCart),
    )
)]
pub async fn validate_cart(
    State(state): State<AppState>,
    Json(lines): Json<Vec<CartLine>>,
) -> impl IntoResponse {
    Json(state.services.cart.validate_cart(&lines).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_address_skips_blank_optionals() {
        let address = Address {
            line1: "12 Quay St".to_string(),
            line2: None,
            city: "Bristol".to_string(),
            state: Some("".to_string()),
            postal_code: "BS1 4DB".to_string(),
            country: "GB".to_string(),
        };
        assert_eq!(address.formatted(), "12 Quay St, Bristol, BS1 4DB, GB");
    }

    #[test]
    fn checkout_request_validation_catches_bad_email() {
        let request = CheckoutRequest {
            customer_name: "A Buyer".to_string(),
            customer_email: "not-an-email".to_string(),
            shipping_address: Address {
                line1: "1 Main".to_string(),
                line2: None,
                city: "Town".to_string(),
                state: None,
                postal_code: "00000".to_string(),
                country: "US".to_string(),
            },
            billing_address: None,
            items: Vec::new(),
        };
        assert!(request.validate().is_err());
    }
}
