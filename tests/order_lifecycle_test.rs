//! Integration tests for the order status lifecycle after checkout.

mod common;

use assert_matches::assert_matches;
use common::spawn_app;
use storefront_api::{
    entities::{OrderStatus, PaymentStatus},
    errors::ServiceError,
    services::carts::{AddToCartInput, CreateCartInput},
    services::checkout::ConfirmCheckoutInput,
    services::payments::{PaymentDetails, PaymentMethod},
};
use uuid::Uuid;

async fn checked_out_order(app: &common::TestApp) -> (storefront_api::entities::StoreModel, Uuid) {
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

    let outcome = app
        .services
        .checkout
        .confirm(
            &store,
            ConfirmCheckoutInput {
                cart_id: cart.id,
                discount_code: None,
                customer_id: None,
                payment: PaymentDetails {
                    method: PaymentMethod::Card,
                    token: Some("tok_visa".to_string()),
                },
            },
        )
        .await
        .unwrap();

    (store, outcome.order.id)
}

#[tokio::test]
async fn orders_move_forward_through_the_lifecycle() {
    let app = spawn_app().await;
    let (store, order_id) = checked_out_order(&app).await;

    let order = app
        .services
        .orders
        .update_status(store.id, order_id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);

    let order = app
        .services
        .orders
        .update_status(store.id, order_id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn delivered_orders_cannot_be_cancelled() {
    let app = spawn_app().await;
    let (store, order_id) = checked_out_order(&app).await;

    app.services
        .orders
        .update_status(store.id, order_id, OrderStatus::Processing)
        .await
        .unwrap();
    app.services
        .orders
        .update_status(store.id, order_id, OrderStatus::Delivered)
        .await
        .unwrap();

    let err = app
        .services
        .orders
        .cancel_order(store.id, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn pending_orders_can_be_cancelled() {
    let app = spawn_app().await;
    let (store, order_id) = checked_out_order(&app).await;

    let order = app
        .services
        .orders
        .cancel_order(store.id, order_id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn order_reads_are_scoped_by_store() {
    let app = spawn_app().await;
    let (_, order_id) = checked_out_order(&app).await;
    let other_store = app.seed_store("Beta").await;

    let err = app
        .services
        .orders
        .get_order(other_store.id, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn payments_are_listed_for_their_order() {
    let app = spawn_app().await;
    let (store, order_id) = checked_out_order(&app).await;

    let payments = app
        .services
        .orders
        .list_payments(store.id, order_id)
        .await
        .unwrap();

    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Captured);
    assert_eq!(payments[0].amount, 10_000);
}

#[tokio::test]
async fn order_listing_paginates_newest_first() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Jacket", 5_000).await;

    for _ in 0..3 {
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
            .confirm(
                &store,
                ConfirmCheckoutInput {
                    cart_id: cart.id,
                    discount_code: None,
                    customer_id: None,
                    payment: PaymentDetails {
                        method: PaymentMethod::Card,
                        token: Some("tok_visa".to_string()),
                    },
                },
            )
            .await
            .unwrap();
    }

    let page = app
        .services
        .orders
        .list_orders(store.id, 1, 2)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.orders.len(), 2);

    let page = app
        .services
        .orders
        .list_orders(store.id, 2, 2)
        .await
        .unwrap();
    assert_eq!(page.orders.len(), 1);
}
