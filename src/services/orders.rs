use crate::{
    entities::{
        order, OrderItemModel, OrderModel, OrderStatus, Order, OrderItem, PaymentModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::payments,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// An order with its line items.
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// A page of orders.
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderModel>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Read side and status lifecycle of the order ledger. Orders are written
/// only by checkout; this service never creates them.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn get_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = self.find_order(store_id, order_id).await?;
        let items = order.find_related(OrderItem).all(&*self.db).await?;

        Ok(OrderWithItems { order, items })
    }

    /// Lists a store's orders, newest first, one-based page numbering.
    pub async fn list_orders(
        &self,
        store_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<OrderPage, ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let paginator = Order::find()
            .filter(order::Column::StoreId.eq(store_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(OrderPage {
            orders,
            total,
            page,
            limit,
        })
    }

    /// Moves an order along its lifecycle. Disallowed transitions are a
    /// conflict, not a silent overwrite.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        store_id: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let order = self.find_order(store_id, order_id).await?;
        let old_status = order.status;

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::Conflict(format!(
                "Order {} cannot move from {:?} to {:?}",
                order_id, old_status, new_status
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: format!("{:?}", old_status).to_lowercase(),
                new_status: format!("{:?}", new_status).to_lowercase(),
            })
            .await;

        if new_status == OrderStatus::Cancelled {
            self.event_sender
                .send_or_log(Event::OrderCancelled(order_id))
                .await;
        }

        info!(
            "Order {} status: {:?} -> {:?}",
            order_id, old_status, new_status
        );
        Ok(updated)
    }

    pub async fn cancel_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderModel, ServiceError> {
        self.update_status(store_id, order_id, OrderStatus::Cancelled)
            .await
    }

    /// Lists payment attempts recorded for an order.
    pub async fn list_payments(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<PaymentModel>, ServiceError> {
        // Scope check before exposing payment rows
        self.find_order(store_id, order_id).await?;
        payments::list_for_order(&*self.db, store_id, order_id).await
    }

    async fn find_order(&self, store_id: Uuid, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        Order::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }
}
