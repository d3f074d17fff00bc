//! Integration tests for the checkout flow: cart validation, discount
//! application, and the all-or-nothing order/payment/cart-clear transaction.

mod common;

use assert_matches::assert_matches;
use common::spawn_app;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use storefront_api::{
    entities::{
        cart_item, discount, CartItem, CartStatus, Discount, DiscountKind, Order, OrderItem,
        OrderStatus, Payment, PaymentStatus,
    },
    errors::ServiceError,
    services::carts::{AddToCartInput, CreateCartInput},
    services::checkout::ConfirmCheckoutInput,
    services::payments::{PaymentDetails, PaymentMethod},
};
use uuid::Uuid;

fn card_payment() -> PaymentDetails {
    PaymentDetails {
        method: PaymentMethod::Card,
        token: Some("tok_visa".to_string()),
    }
}

fn confirm_input(cart_id: Uuid, discount_code: Option<&str>) -> ConfirmCheckoutInput {
    ConfirmCheckoutInput {
        cart_id,
        discount_code: discount_code.map(str::to_string),
        customer_id: None,
        payment: card_payment(),
    }
}

#[tokio::test]
async fn checkout_creates_order_payment_and_clears_cart() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme Outfitters").await;
    let product = app.seed_product(&store, "Wool Socks", 4_999).await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();

    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();

    let outcome = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, None))
        .await
        .unwrap();

    assert_eq!(outcome.order.subtotal, 9_998);
    assert_eq!(outcome.order.discount_total, 0);
    assert_eq!(outcome.order.total, 9_998);
    assert_eq!(outcome.order.status, OrderStatus::Pending);
    assert_eq!(outcome.order.currency, store.currency);
    assert!(outcome.order.order_number.starts_with("ORD-"));

    // Order items snapshot name, price, and quantity
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].name, "Wool Socks");
    assert_eq!(outcome.items[0].quantity, 2);
    assert_eq!(outcome.items[0].unit_price, 4_999);
    assert_eq!(outcome.items[0].line_total, 9_998);

    // Payment captured for the full total
    assert_eq!(outcome.payment.amount, 9_998);
    assert_eq!(outcome.payment.status, PaymentStatus::Captured);
    assert!(outcome.payment.gateway_response.is_some());

    // Cart is cleared and closed out
    let remaining = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .all(&*app.db)
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let cart_after = storefront_api::entities::Cart::find_by_id(cart.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cart_after.status, CartStatus::Converted);
}

#[tokio::test]
async fn percentage_discount_is_applied_and_redeemed() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Jacket", 10_000).await;
    let discount = app
        .seed_discount(&store, "SAVE20", DiscountKind::Percentage, 20)
        .await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    // Codes are normalized before lookup
    let outcome = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, Some("  save20 ")))
        .await
        .unwrap();

    assert_eq!(outcome.order.subtotal, 10_000);
    assert_eq!(outcome.order.discount_total, 2_000);
    assert_eq!(outcome.order.total, 8_000);
    assert_eq!(outcome.order.discount_id, Some(discount.id));
    assert_eq!(outcome.payment.amount, 8_000);

    let discount_after = Discount::find_by_id(discount.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(discount_after.used_count, 1);
}

#[tokio::test]
async fn percentage_discount_respects_cap() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Jacket", 10_000).await;
    app.seed_discount_with(&store, "SAVE20", DiscountKind::Percentage, 20, |mut input| {
        input.max_discount_amount = Some(1_500);
        input
    })
    .await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let outcome = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, Some("SAVE20")))
        .await
        .unwrap();

    assert_eq!(outcome.order.discount_total, 1_500);
    assert_eq!(outcome.order.total, 8_500);
}

#[tokio::test]
async fn fixed_discount_never_exceeds_subtotal() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Sticker", 300).await;
    app.seed_discount(&store, "FLAT500", DiscountKind::Fixed, 500)
        .await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let outcome = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, Some("FLAT500")))
        .await
        .unwrap();

    assert_eq!(outcome.order.subtotal, 300);
    assert_eq!(outcome.order.discount_total, 300);
    assert_eq!(outcome.order.total, 0);
}

#[tokio::test]
async fn unknown_cart_fails_without_writes() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;

    let err = app
        .services
        .checkout
        .confirm(&store, confirm_input(Uuid::new_v4(), None))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::CartNotFound(_));

    assert_eq!(Order::find().all(&*app.db).await.unwrap().len(), 0);
    assert_eq!(Payment::find().all(&*app.db).await.unwrap().len(), 0);
}

#[tokio::test]
async fn empty_cart_fails_without_writes() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();

    let err = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, None))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::EmptyCart(id) if id == cart.id);

    assert_eq!(Order::find().all(&*app.db).await.unwrap().len(), 0);
    assert_eq!(Payment::find().all(&*app.db).await.unwrap().len(), 0);
}

#[tokio::test]
async fn cart_from_another_store_is_not_found() {
    let app = spawn_app().await;
    let store_a = app.seed_store("Alpha").await;
    let store_b = app.seed_store("Beta").await;
    let product = app.seed_product(&store_a, "Mug", 1_200).await;

    let cart = app
        .services
        .carts
        .create_cart(store_a.id, &store_a.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store_a.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .checkout
        .confirm(&store_b, confirm_input(cart.id, None))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::CartNotFound(_));
}

#[tokio::test]
async fn declined_payment_rolls_back_the_whole_attempt() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Jacket", 10_000).await;
    let discount = app
        .seed_discount(&store, "SAVE20", DiscountKind::Percentage, 20)
        .await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    // Card payments require a token; this one is declined mid-transaction,
    // after the order insert and discount redemption
    let err = app
        .services
        .checkout
        .confirm(
            &store,
            ConfirmCheckoutInput {
                cart_id: cart.id,
                discount_code: Some("SAVE20".to_string()),
                customer_id: None,
                payment: PaymentDetails {
                    method: PaymentMethod::Card,
                    token: None,
                },
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::PaymentFailed(_));

    // No order or payment row persists
    assert_eq!(Order::find().all(&*app.db).await.unwrap().len(), 0);
    assert_eq!(OrderItem::find().all(&*app.db).await.unwrap().len(), 0);
    assert_eq!(Payment::find().all(&*app.db).await.unwrap().len(), 0);

    // The cart survives untouched
    let items = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);

    // The redemption inside the failed transaction was rolled back too
    let discount_after = Discount::find_by_id(discount.id)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(discount_after.used_count, 0);
}

#[tokio::test]
async fn converted_cart_cannot_be_checked_out_twice() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Jacket", 10_000).await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    app.services
        .checkout
        .confirm(&store, confirm_input(cart.id, None))
        .await
        .unwrap();

    let err = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, None))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidOperation(_));
    assert_eq!(Order::find().all(&*app.db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn exhausted_discount_falls_back_to_full_price() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Jacket", 10_000).await;
    let discount = app
        .seed_discount_with(&store, "SAVE20", DiscountKind::Percentage, 20, |mut input| {
            input.usage_limit = Some(1);
            input
        })
        .await;

    // Exhaust the discount out of band
    let mut exhausted: discount::ActiveModel = discount.clone().into();
    exhausted.used_count = Set(1);
    exhausted.update(&*app.db).await.unwrap();

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();
    app.services
        .carts
        .add_item(
            store.id,
            cart.id,
            AddToCartInput {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    // Ineligible discounts are silently treated as "no discount"
    let outcome = app
        .services
        .checkout
        .confirm(&store, confirm_input(cart.id, Some("SAVE20")))
        .await
        .unwrap();

    assert_eq!(outcome.order.discount_total, 0);
    assert_eq!(outcome.order.total, 10_000);
    assert_eq!(outcome.order.discount_id, None);
}
