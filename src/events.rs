use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services.
///
/// Consumed by a single in-process task ([`process_events`]); there is no
/// durable delivery, these exist for observability and future fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),

    // Catalog events
    ArtworkCreated(Uuid),
    ArtworkUpdated(Uuid),
    ArtworkDeleted(Uuid),

    // Checkout events
    PaymentIntentCreated {
        payment_intent_id: String,
        order_number: String,
    },
    PaymentSucceeded {
        payment_intent_id: String,
    },
    /// A cart line failed validation because the claimed price did not match
    /// the authoritative price. Kept distinct for fraud monitoring.
    CartPriceMismatch {
        artwork_id: Uuid,
        claimed_price: String,
        actual_price: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("Event dropped: {}", err);
        }
    }
}

/// Drains the event channel, logging each event.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::CartPriceMismatch {
                artwork_id,
                claimed_price,
                actual_price,
            } => {
                // Surfaced at warn level so fraud monitoring can alert on it
                warn!(
                    %artwork_id,
                    claimed_price,
                    actual_price,
                    "cart price mismatch detected"
                );
            }
            other => info!(event = ?other, "event processed"),
        }
    }
    info!("Event channel closed; event processor exiting");
}
