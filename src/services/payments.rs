use crate::{config::AppConfig, errors::ServiceError};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::{instrument, warn};

type HmacSha256 = Hmac<Sha256>;

/// A payment intent created at the processor. `amount` is in minor units.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

/// A verified webhook event. `data` holds the processor's raw object payload;
/// callers dispatch on `event_type` before digging into it.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CreatedIntent {
    id: String,
    client_secret: String,
}

/// Thin client for the payment processor's REST API plus webhook signature
/// verification. Failed calls are not retried here; retry policy belongs to
/// the caller.
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
    webhook_secret: String,
    webhook_tolerance_secs: i64,
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        api_base: String,
        webhook_secret: String,
        webhook_tolerance_secs: i64,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            api_base,
            webhook_secret,
            webhook_tolerance_secs,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.stripe_secret_key.clone(),
            cfg.stripe_api_base.clone(),
            cfg.payment_webhook_secret.clone(),
            cfg.payment_webhook_tolerance_secs as i64,
        )
    }

    /// Creates a payment intent for `amount` major units.
    ///
    /// The amount is converted to minor units with half-up rounding, automatic
    /// payment-method selection is always enabled, and `metadata` is attached
    /// verbatim for reconciliation in the webhook handler.
    #[instrument(skip(self, metadata))]
    pub async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, ServiceError> {
        let minor = to_minor_units(amount).ok_or_else(|| {
            ServiceError::ValidationError(format!("payment amount out of range: {amount}"))
        })?;

        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), minor.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|err| ServiceError::ExternalServiceError(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::PaymentFailed(format!(
                "payment intent creation failed ({status}): {body}"
            )));
        }

        let created: CreatedIntent = response
            .json()
            .await
            .map_err(|err| ServiceError::ExternalServiceError(err.to_string()))?;

        Ok(PaymentIntent {
            id: created.id,
            client_secret: created.client_secret,
            amount: minor,
            currency: currency.to_string(),
        })
    }

    /// Verifies a `t=..,v1=..` signature header against the raw payload and
    /// returns the parsed event.
    ///
    /// Any failure (malformed header, timestamp outside tolerance, signature
    /// mismatch) is an error; callers must reject the request and never
    /// process the payload.
    pub fn verify_webhook_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, ServiceError> {
        let mut timestamp = "";
        let mut signature = "";
        for part in signature_header.split(',') {
            let mut it = part.trim().splitn(2, '=');
            match (it.next(), it.next()) {
                (Some("t"), Some(value)) => timestamp = value,
                (Some("v1"), Some(value)) => signature = value,
                _ => {}
            }
        }

        if timestamp.is_empty() || signature.is_empty() {
            return Err(ServiceError::Unauthorized(
                "malformed webhook signature header".to_string(),
            ));
        }

        let ts: i64 = timestamp.parse().map_err(|_| {
            ServiceError::Unauthorized("invalid webhook timestamp".to_string())
        })?;
        let skew = (Utc::now().timestamp() - ts).abs();
        if skew > self.webhook_tolerance_secs {
            warn!(skew, "webhook timestamp outside tolerance");
            return Err(ServiceError::Unauthorized(
                "webhook timestamp outside tolerance".to_string(),
            ));
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| ServiceError::InternalError("invalid webhook secret".to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(&expected, signature) {
            return Err(ServiceError::Unauthorized(
                "invalid webhook signature".to_string(),
            ));
        }

        serde_json::from_slice(payload)
            .map_err(|err| ServiceError::BadRequest(format!("invalid webhook payload: {err}")))
    }
}

/// Converts a major-unit amount to minor units (cents), rounding half up.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Generates a human-readable order number: `YOA-YYYYMMDD-NNNN`.
///
/// The 4-digit suffix is random; uniqueness is probabilistic and collisions
/// are not retried. The order table's primary key is the UUID, not this.
pub fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("YOA-{date}-{suffix:04}")
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn test_client() -> StripeClient {
        StripeClient::new(
            "sk_test_xxx".to_string(),
            "https://api.stripe.test".to_string(),
            "whsec_test123secret456".to_string(),
            300,
        )
    }

    fn sign(payload: &[u8], secret: &str, timestamp: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("any key size works");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn minor_unit_rounding_is_half_up() {
        assert_eq!(to_minor_units(dec!(100.005)), Some(10001));
        assert_eq!(to_minor_units(dec!(99.99)), Some(9999));
        assert_eq!(to_minor_units(dec!(100)), Some(10000));
        assert_eq!(to_minor_units(dec!(0.004)), Some(0));
        assert_eq!(to_minor_units(dec!(465.00)), Some(46500));
    }

    #[test]
    fn order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "YOA");
        assert_eq!(parts[1], Utc::now().format("%Y%m%d").to_string());
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn order_number_suffixes_are_mostly_distinct() {
        // Documents, does not guarantee, uniqueness of the random suffix.
        let distinct: HashSet<String> = (0..100).map(|_| generate_order_number()).collect();
        assert!(distinct.len() > 95, "only {} distinct", distinct.len());
    }

    #[test]
    fn valid_signature_is_accepted() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{}}"#;
        let ts = Utc::now().timestamp().to_string();
        let sig = sign(payload, "whsec_test123secret456", &ts);

        let event = client
            .verify_webhook_event(payload, &format!("t={ts},v1={sig}"))
            .expect("valid signature should verify");
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "payment_intent.succeeded");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{}}"#;
        let ts = Utc::now().timestamp().to_string();
        let sig = sign(payload, "wrong_secret", &ts);

        let err = client
            .verify_webhook_event(payload, &format!("t={ts},v1={sig}"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn modified_payload_is_rejected() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{}}"#;
        let tampered = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"x":1}}"#;
        let ts = Utc::now().timestamp().to_string();
        let sig = sign(payload, "whsec_test123secret456", &ts);

        let err = client
            .verify_webhook_event(tampered, &format!("t={ts},v1={sig}"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{}}"#;
        // 10 minutes old, past the 5-minute tolerance
        let ts = (Utc::now().timestamp() - 600).to_string();
        let sig = sign(payload, "whsec_test123secret456", &ts);

        let err = client
            .verify_webhook_event(payload, &format!("t={ts},v1={sig}"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn malformed_header_is_rejected() {
        let client = test_client();
        let payload = br#"{"id":"evt_1","type":"x","data":{}}"#;

        for header in ["garbage", "t=123", "v1=deadbeef", ""] {
            let err = client.verify_webhook_event(payload, header).unwrap_err();
            assert!(matches!(err, ServiceError::Unauthorized(_)), "{header}");
        }
    }

    #[test]
    fn unparseable_payload_fails_after_signature_check() {
        let client = test_client();
        let payload = b"not json";
        let ts = Utc::now().timestamp().to_string();
        let sig = sign(payload, "whsec_test123secret456", &ts);

        let err = client
            .verify_webhook_event(payload, &format!("t={ts},v1={sig}"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }
}
