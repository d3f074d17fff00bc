use crate::{
    entities::{
        cart, cart_item, product, Cart, CartItem, CartItemModel, CartModel, CartStatus, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Cart creation parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCartInput {
    pub session_id: Option<String>,
    pub customer_id: Option<Uuid>,
}

/// Item addition parameters.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// A cart with its items and the subtotal computed from the snapshots.
#[derive(Debug, Serialize)]
pub struct CartWithItems {
    pub cart: CartModel,
    pub items: Vec<CartItemModel>,
    pub subtotal: i64,
}

impl CartWithItems {
    fn new(cart: CartModel, items: Vec<CartItemModel>) -> Self {
        let subtotal = items.iter().map(CartItemModel::line_total).sum();
        Self {
            cart,
            items,
            subtotal,
        }
    }
}

/// Storefront cart management: creation, item changes with unit-price
/// snapshots, and clearing. All lookups are scoped by store.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a cart for a store in the given currency.
    #[instrument(skip(self, input))]
    pub async fn create_cart(
        &self,
        store_id: Uuid,
        currency: &str,
        input: CreateCartInput,
    ) -> Result<CartModel, ServiceError> {
        let cart_id = Uuid::new_v4();
        let now = Utc::now();

        let cart = cart::ActiveModel {
            id: Set(cart_id),
            store_id: Set(store_id),
            session_id: Set(input.session_id),
            customer_id: Set(input.customer_id),
            currency: Set(currency.to_string()),
            status: Set(CartStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let cart = cart.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated(cart_id))
            .await;

        info!("Created cart: {}", cart_id);
        Ok(cart)
    }

    /// Retrieves a cart with its items, scoped to the store.
    pub async fn get_cart(
        &self,
        store_id: Uuid,
        cart_id: Uuid,
    ) -> Result<CartWithItems, ServiceError> {
        let cart = self.find_cart(store_id, cart_id).await?;
        let items = cart.find_related(CartItem).all(&*self.db).await?;

        Ok(CartWithItems::new(cart, items))
    }

    /// Adds an item to the cart, or merges quantity when the product is
    /// already present. The unit price is snapshotted from the product at
    /// this moment and not refreshed afterwards.
    #[instrument(skip(self, input))]
    pub async fn add_item(
        &self,
        store_id: Uuid,
        cart_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartWithItems, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let cart = Cart::find()
            .filter(cart::Column::Id.eq(cart_id))
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        if cart.status != CartStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Cart is not active".to_string(),
            ));
        }

        let product = Product::find()
            .filter(product::Column::Id.eq(input.product_id))
            .filter(product::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        if !product.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Product {} is not available",
                product.id
            )));
        }

        let existing_item = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        if let Some(item) = existing_item {
            let quantity = item.quantity + input.quantity;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;
        } else {
            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                unit_price: Set(product.price),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            item.insert(&txn).await?;
        }

        let cart = self.touch_cart(&txn, cart).await?;
        let items = cart.find_related(CartItem).all(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Added item to cart {}: product {} x{}",
            cart_id, input.product_id, input.quantity
        );
        Ok(CartWithItems::new(cart, items))
    }

    /// Updates a cart item's quantity; zero or less removes the item.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        store_id: Uuid,
        cart_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartWithItems, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = Cart::find()
            .filter(cart::Column::Id.eq(cart_id))
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        if cart.status != CartStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Cart is not active".to_string(),
            ));
        }

        let item = CartItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        if item.cart_id != cart_id {
            return Err(ServiceError::InvalidOperation(
                "Item does not belong to this cart".to_string(),
            ));
        }

        let removed = quantity <= 0;
        if removed {
            CartItem::delete_by_id(item_id).exec(&txn).await?;
        } else {
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;
        }

        let cart = self.touch_cart(&txn, cart).await?;
        let items = cart.find_related(CartItem).all(&txn).await?;

        txn.commit().await?;

        if removed {
            self.event_sender
                .send_or_log(Event::CartItemRemoved { cart_id, item_id })
                .await;
        } else {
            self.event_sender
                .send_or_log(Event::CartItemUpdated { cart_id, item_id })
                .await;
        }

        Ok(CartWithItems::new(cart, items))
    }

    /// Removes every item from the cart. The cart itself stays open.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, store_id: Uuid, cart_id: Uuid) -> Result<(), ServiceError> {
        let cart = self.find_cart(store_id, cart_id).await?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart_id))
            .await;

        Ok(())
    }

    async fn find_cart(&self, store_id: Uuid, cart_id: Uuid) -> Result<CartModel, ServiceError> {
        Cart::find()
            .filter(cart::Column::Id.eq(cart_id))
            .filter(cart::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }

    async fn touch_cart<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        cart: CartModel,
    ) -> Result<CartModel, ServiceError> {
        let mut update: cart::ActiveModel = cart.into();
        update.updated_at = Set(Utc::now());
        Ok(update.update(conn).await?)
    }
}
