use crate::{
    db::Transactor,
    entities::{
        cart, cart_item, order, order_item, product, Cart, CartItem, CartModel, CartItemModel,
        CartStatus, OrderItemModel, OrderModel, OrderStatus, PaymentModel, Product,
        StoreModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{discounts, payments, payments::PaymentDetails},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Checkout confirmation input, as supplied by the HTTP handler.
#[derive(Debug, Clone)]
pub struct ConfirmCheckoutInput {
    pub cart_id: Uuid,
    pub discount_code: Option<String>,
    pub customer_id: Option<Uuid>,
    pub payment: PaymentDetails,
}

/// Everything the checkout transaction produced.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    pub payment: PaymentModel,
    pub redeemed_discount_id: Option<Uuid>,
}

/// Confirms carts into orders: validates the cart, applies an optional
/// discount, records the order, payment, and cart clearing as one atomic
/// unit via the transaction coordinator.
#[derive(Clone)]
pub struct CheckoutService {
    transactor: Transactor,
    event_sender: Arc<EventSender>,
    payment_provider: String,
}

/// Confirms the cart exists for the (store, cart) pair, is still open, and
/// holds at least one item. These are data-integrity preconditions, not
/// transient failures; each is terminal for the current checkout attempt.
pub async fn load_cart_for_checkout<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    cart_id: Uuid,
) -> Result<(CartModel, Vec<CartItemModel>), ServiceError> {
    let cart = Cart::find()
        .filter(cart::Column::Id.eq(cart_id))
        .filter(cart::Column::StoreId.eq(store_id))
        .one(conn)
        .await?
        .ok_or(ServiceError::CartNotFound(cart_id))?;

    if cart.status != CartStatus::Active {
        return Err(ServiceError::InvalidOperation(format!(
            "Cart {} has already been checked out",
            cart_id
        )));
    }

    let items = cart.find_related(CartItem).all(conn).await?;
    if items.is_empty() {
        return Err(ServiceError::EmptyCart(cart_id));
    }

    Ok((cart, items))
}

impl CheckoutService {
    pub fn new(
        transactor: Transactor,
        event_sender: Arc<EventSender>,
        payment_provider: String,
    ) -> Self {
        Self {
            transactor,
            event_sender,
            payment_provider,
        }
    }

    /// Confirms a checkout for the store.
    ///
    /// Inside a single transaction, strictly in order: cart validation,
    /// subtotal from item snapshots, discount eligibility + atomic
    /// redemption, order + order item inserts, payment authorization and
    /// recording, cart clearing. Any failure rolls the whole attempt back;
    /// events go out only after commit.
    #[instrument(skip(self, input), fields(store_id = %store.id, cart_id = %input.cart_id))]
    pub async fn confirm(
        &self,
        store: &StoreModel,
        input: ConfirmCheckoutInput,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let store_id = store.id;
        let cart_id = input.cart_id;
        let currency = store.currency.clone();
        let provider = self.payment_provider.clone();

        let outcome = self
            .transactor
            .run(move |txn| {
                Box::pin(async move {
                    let (cart, cart_items) =
                        load_cart_for_checkout(txn, store_id, input.cart_id).await?;

                    let subtotal: i64 = cart_items.iter().map(CartItemModel::line_total).sum();

                    let applied = discounts::find_eligible(
                        txn,
                        store_id,
                        input.discount_code.as_deref(),
                        subtotal,
                        Utc::now(),
                    )
                    .await?;

                    // Redeem before writing the order: the conditional
                    // increment is the usage-limit race guard, and losing it
                    // simply reverts to the no-discount path.
                    let mut deduction = 0;
                    let mut redeemed_discount_id = None;
                    if let Some(applied) = applied {
                        if discounts::redeem(txn, applied.discount.id).await? {
                            deduction = applied.deduction;
                            redeemed_discount_id = Some(applied.discount.id);
                        }
                    }

                    let total = subtotal - deduction;

                    let order_id = Uuid::new_v4();
                    let now = Utc::now();
                    let order = order::ActiveModel {
                        id: Set(order_id),
                        store_id: Set(store_id),
                        order_number: Set(format!(
                            "ORD-{}",
                            order_id.simple().to_string()[..8].to_uppercase()
                        )),
                        customer_id: Set(input.customer_id.or(cart.customer_id)),
                        cart_id: Set(Some(cart.id)),
                        status: Set(OrderStatus::Pending),
                        currency: Set(currency),
                        subtotal: Set(subtotal),
                        discount_total: Set(deduction),
                        total: Set(total),
                        discount_id: Set(redeemed_discount_id),
                        notes: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    let order = order.insert(txn).await?;

                    // Product names are snapshotted onto order items
                    let product_ids: Vec<Uuid> =
                        cart_items.iter().map(|item| item.product_id).collect();
                    let names: HashMap<Uuid, String> = Product::find()
                        .filter(product::Column::Id.is_in(product_ids))
                        .all(txn)
                        .await?
                        .into_iter()
                        .map(|p| (p.id, p.name))
                        .collect();

                    let mut items = Vec::with_capacity(cart_items.len());
                    for cart_item in &cart_items {
                        let item = order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order_id),
                            product_id: Set(cart_item.product_id),
                            name: Set(names
                                .get(&cart_item.product_id)
                                .cloned()
                                .unwrap_or_else(|| {
                                    format!("Product {}", cart_item.product_id)
                                })),
                            quantity: Set(cart_item.quantity),
                            unit_price: Set(cart_item.unit_price),
                            line_total: Set(cart_item.line_total()),
                            created_at: Set(now),
                        };
                        items.push(item.insert(txn).await?);
                    }

                    let payment =
                        payments::authorize_and_record(txn, &order, &input.payment, &provider)
                            .await?;

                    // Clear the cart and close it out
                    CartItem::delete_many()
                        .filter(cart_item::Column::CartId.eq(cart.id))
                        .exec(txn)
                        .await?;

                    let mut cart_update: cart::ActiveModel = cart.into();
                    cart_update.status = Set(CartStatus::Converted);
                    cart_update.updated_at = Set(Utc::now());
                    cart_update.update(txn).await?;

                    Ok::<_, ServiceError>(CheckoutOutcome {
                        order,
                        items,
                        payment,
                        redeemed_discount_id,
                    })
                })
            })
            .await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(outcome.order.id))
            .await;
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                cart_id,
                order_id: outcome.order.id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::PaymentRecorded {
                payment_id: outcome.payment.id,
                order_id: outcome.order.id,
            })
            .await;
        if let Some(discount_id) = outcome.redeemed_discount_id {
            self.event_sender
                .send_or_log(Event::DiscountRedeemed {
                    discount_id,
                    order_id: outcome.order.id,
                })
                .await;
        }

        info!(
            order_id = %outcome.order.id,
            order_number = %outcome.order.order_number,
            total = outcome.order.total,
            "checkout completed"
        );

        Ok(outcome)
    }
}
