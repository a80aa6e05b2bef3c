use crate::{
    config::AppConfig,
    entities::{artwork, Artwork},
    events::{Event, EventSender},
};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// A client-submitted cart line. Untrusted: the claimed title and price exist
/// only so mismatches can be reported; pricing always uses the store record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub artwork_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub quantity: i32,
    pub slug: String,
}

/// Result of validating a proposed cart against authoritative records.
///
/// Recomputed on every call and never cached: price and inventory can change
/// between requests. `items` may be non-empty while `is_valid` is false;
/// callers must gate everything on `is_valid`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidatedCart {
    pub is_valid: bool,
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub errors: Vec<String>,
}

impl ValidatedCart {
    fn rejected(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            errors,
        }
    }
}

/// Validates and re-prices proposed carts against the artwork catalog.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Re-checks every submitted line against the store and re-prices the cart.
    ///
    /// Never returns `Err`: validation outcomes, including store failures, are
    /// reported through the returned [`ValidatedCart`]. Every line is checked
    /// even after earlier lines fail, so the caller gets one error per bad
    /// line. The product fetch is a single `id IN (...)` query regardless of
    /// cart size.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn validate_cart(&self, lines: &[CartLine]) -> ValidatedCart {
        if lines.is_empty() {
            return ValidatedCart::rejected(vec!["Cart is empty".to_string()]);
        }

        let mut ids: Vec<Uuid> = lines.iter().map(|line| line.artwork_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let records = match Artwork::find()
            .filter(artwork::Column::Id.is_in(ids))
            .all(&*self.db)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                // Store details stay in the logs; callers get a fixed message.
                error!(error = %err, "artwork lookup failed during cart validation");
                return ValidatedCart::rejected(vec![
                    "Failed to validate cart items".to_string()
                ]);
            }
        };

        let by_id: HashMap<Uuid, &artwork::Model> =
            records.iter().map(|record| (record.id, record)).collect();

        let mut items = Vec::with_capacity(lines.len());
        let mut errors = Vec::new();

        for line in lines {
            let Some(record) = by_id.get(&line.artwork_id) else {
                errors.push(format!("Item \"{}\" not found", line.title));
                continue;
            };

            if !record.is_published {
                errors.push(format!("Item \"{}\" is no longer available", record.title));
                continue;
            }

            if record.price != line.price {
                warn!(
                    artwork_id = %record.id,
                    claimed = %line.price,
                    actual = %record.price,
                    "cart price mismatch; possible tampering"
                );
                self.event_sender
                    .send_or_log(Event::CartPriceMismatch {
                        artwork_id: record.id,
                        claimed_price: line.price.to_string(),
                        actual_price: record.price.to_string(),
                    })
                    .await;
                errors.push(format!(
                    "Price for \"{}\" has changed. Please refresh your cart.",
                    record.title
                ));
                continue;
            }

            if record.inventory_count < line.quantity {
                errors.push(format!(
                    "Only {} of \"{}\" available",
                    record.inventory_count, record.title
                ));
                continue;
            }

            // Accepted: always the authoritative price and title.
            items.push(CartLine {
                artwork_id: record.id,
                title: record.title.clone(),
                price: record.price,
                quantity: line.quantity,
                slug: record.slug.clone(),
            });
        }

        let subtotal = round2(
            items
                .iter()
                .map(|item| item.price * Decimal::from(item.quantity))
                .sum(),
        );
        let shipping_cost = self.config.shipping_cost();
        // Tax is computed by the payment processor at confirmation time.
        let tax_amount = Decimal::ZERO;
        let total = round2(subtotal + shipping_cost + tax_amount);

        ValidatedCart {
            is_valid: errors.is_empty() && !items.is_empty(),
            items,
            subtotal,
            shipping_cost,
            tax_amount,
            total,
            errors,
        }
    }
}

/// 2-decimal currency rounding, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(dec!(10.005)), dec!(10.01));
        assert_eq!(round2(dec!(10.004)), dec!(10.00));
        assert_eq!(round2(dec!(99.99)), dec!(99.99));
    }

    #[test]
    fn rejected_cart_zeroes_all_totals() {
        let cart = ValidatedCart::rejected(vec!["Cart is empty".to_string()]);
        assert!(!cart.is_valid);
        assert!(cart.items.is_empty());
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert_eq!(cart.shipping_cost, Decimal::ZERO);
        assert_eq!(cart.tax_amount, Decimal::ZERO);
        assert_eq!(cart.total, Decimal::ZERO);
        assert_eq!(cart.errors, vec!["Cart is empty".to_string()]);
    }

    #[test]
    fn subtotal_rounds_at_the_sum_not_per_line() {
        // Three lines of 33.333 each: per-line rounding would give 99.99,
        // rounding at the sum gives 100.00.
        let lines = [dec!(33.333), dec!(33.333), dec!(33.333)];
        let sum: Decimal = lines.iter().copied().sum();
        assert_eq!(round2(sum), dec!(100.00));
    }

    #[test]
    fn cart_line_deserializes_from_checkout_payload() {
        let json = r#"{
            "artwork_id": "550e8400-e29b-41d4-a716-446655440000",
            "title": "Harbor at Dusk",
            "price": "450.00",
            "quantity": 1,
            "slug": "harbor-at-dusk"
        }"#;

        let line: CartLine = serde_json::from_str(json).expect("cart line should deserialize");
        assert_eq!(line.price, dec!(450.00));
        assert_eq!(line.quantity, 1);
        assert_eq!(line.slug, "harbor-at-dusk");
    }
}
