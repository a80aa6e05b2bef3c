use crate::{
    entities::{
        artwork, order,
        order::OrderStatus,
        order_item, Order, OrderItem,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::cart::round2,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A line item carried over from the validated cart snapshot.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub artwork_id: Uuid,
    pub title: String,
    pub slug: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Everything needed to materialize an order from a succeeded payment.
/// Built from intent metadata by the webhook handler; nothing here comes
/// from the client at webhook time.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub payment_intent_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub items: Vec<NewOrderItem>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Materializes an order from a verified payment-succeeded webhook.
    ///
    /// Idempotent on `payment_intent_id`: a redelivered webhook returns the
    /// existing order instead of creating a second one. The existence check
    /// plus the unique column cover the re-delivery race; losing the race
    /// surfaces as a unique-constraint violation which is resolved by
    /// re-reading the winner's row.
    #[instrument(skip(self, new_order), fields(payment_intent_id = %new_order.payment_intent_id))]
    pub async fn create_from_payment_intent(
        &self,
        new_order: NewOrder,
    ) -> Result<order::Model, ServiceError> {
        if let Some(existing) = self
            .find_by_payment_intent(&new_order.payment_intent_id)
            .await?
        {
            info!(
                order_id = %existing.id,
                "order already materialized for this payment intent; skipping"
            );
            return Ok(existing);
        }

        let result = self.insert_order(&new_order).await;

        match result {
            Ok(created) => {
                self.event_sender
                    .send_or_log(Event::OrderCreated(created.id))
                    .await;
                Ok(created)
            }
            Err(ServiceError::DatabaseError(db_err)) => {
                // Concurrent delivery of the same event: the other insert won.
                if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    self.find_by_payment_intent(&new_order.payment_intent_id)
                        .await?
                        .ok_or(ServiceError::DatabaseError(db_err))
                } else {
                    Err(ServiceError::DatabaseError(db_err))
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn insert_order(&self, new_order: &NewOrder) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let created = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(new_order.order_number.clone()),
            payment_intent_id: Set(new_order.payment_intent_id.clone()),
            customer_name: Set(new_order.customer_name.clone()),
            customer_email: Set(new_order.customer_email.clone()),
            shipping_address: Set(new_order.shipping_address.clone()),
            billing_address: Set(new_order.billing_address.clone()),
            subtotal: Set(new_order.subtotal),
            shipping_cost: Set(new_order.shipping_cost),
            tax_amount: Set(new_order.tax_amount),
            total: Set(new_order.total),
            status: Set(OrderStatus::Paid),
            payment_status: Set("succeeded".to_string()),
            tracking_number: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for item in &new_order.items {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                artwork_id: Set(item.artwork_id),
                title: Set(item.title.clone()),
                slug: Set(item.slug.clone()),
                unit_price: Set(item.unit_price),
                quantity: Set(item.quantity),
                line_total: Set(round2(item.unit_price * Decimal::from(item.quantity))),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            // Sold inventory comes off the shelf here, not at checkout. With
            // no reservation step, concurrent sales can briefly drive the
            // count negative; treated as oversell to resolve manually.
            artwork::Entity::update_many()
                .col_expr(
                    artwork::Column::InventoryCount,
                    Expr::col(artwork::Column::InventoryCount).sub(item.quantity),
                )
                .filter(artwork::Column::Id.eq(item.artwork_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        info!(order_id = %created.id, order_number = %created.order_number, "order created");
        Ok(created)
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        Ok(Order::find()
            .filter(order::Column::PaymentIntentId.eq(payment_intent_id))
            .one(&*self.db)
            .await?)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order with ID {id} not found")))
    }

    pub async fn get_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<order::Model, ServiceError> {
        Order::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_number} not found")))
    }

    pub async fn get_order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?)
    }

    /// Lists orders newest first. Pages are 1-based.
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    /// Admin status update. Jumps across the forward chain are allowed;
    /// only leaving `cancelled` is rejected.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;

        if existing.status == OrderStatus::Cancelled {
            return Err(ServiceError::InvalidStatus(
                "Cancelled orders cannot change status".to_string(),
            ));
        }

        let old_status = existing.status;
        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.as_str().to_string(),
                new_status: new_status.as_str().to_string(),
            })
            .await;

        Ok(updated)
    }

    /// Cancels an order. Terminal; already-cancelled orders are left as-is.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;

        if existing.status == OrderStatus::Cancelled {
            return Ok(existing);
        }

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderCancelled(id))
            .await;

        Ok(updated)
    }

    pub async fn set_tracking_number(
        &self,
        id: Uuid,
        tracking_number: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;
        let mut active: order::ActiveModel = existing.into();
        active.tracking_number = Set(tracking_number);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    pub async fn set_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;
        let mut active: order::ActiveModel = existing.into();
        active.notes = Set(notes);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }
}
