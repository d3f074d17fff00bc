use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events emitted by the services after state changes commit.
///
/// Delivery is fire-and-forget over a bounded channel; nothing in the
/// request path waits on a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Store events
    StoreCreated(Uuid),

    // Catalog events
    ProductCreated(Uuid),

    // Cart events
    CartCreated(Uuid),
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartItemUpdated { cart_id: Uuid, item_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },
    CartCleared(Uuid),

    // Discount events
    DiscountCreated(Uuid),
    DiscountDeactivated(Uuid),
    DiscountRedeemed { discount_id: Uuid, order_id: Uuid },

    // Checkout / order events
    CheckoutCompleted { cart_id: Uuid, order_id: Uuid },
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),

    // Payment events
    PaymentRecorded { payment_id: Uuid, order_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
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

    /// Sends an event, logging instead of failing when the channel is closed
    /// or full. State changes must not be rolled back because a consumer is
    /// lagging.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

/// Drains the event channel, logging each event. Integrations (webhooks,
/// analytics) subscribe by replacing or extending the match arms.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CheckoutCompleted { cart_id, order_id } => {
                info!(%cart_id, %order_id, "checkout completed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "order status changed");
            }
            Event::DiscountRedeemed {
                discount_id,
                order_id,
            } => {
                info!(%discount_id, %order_id, "discount redeemed");
            }
            other => debug!(event = ?other, "event received"),
        }
    }

    info!("Event channel closed; processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender.send(Event::CartCreated(Uuid::nil())).await.unwrap();

        match rx.recv().await {
            Some(Event::CartCreated(id)) => assert_eq!(id, Uuid::nil()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or return an error to the caller
        sender.send_or_log(Event::CartCleared(Uuid::nil())).await;
    }
}
