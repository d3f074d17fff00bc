//! Integration tests for cart management and store slug handling.

mod common;

use assert_matches::assert_matches;
use common::spawn_app;
use storefront_api::{
    errors::ServiceError,
    services::carts::{AddToCartInput, CreateCartInput},
    services::stores::CreateStoreInput,
};
use uuid::Uuid;

#[tokio::test]
async fn add_item_snapshots_price_and_merges_quantity() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Mug", 1_000).await;

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

    // Adding the same product again merges into one line
    let view = app
        .services
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

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 3);
    assert_eq!(view.items[0].unit_price, 1_000);
    assert_eq!(view.subtotal, 3_000);
}

#[tokio::test]
async fn update_quantity_zero_removes_the_item() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let product = app.seed_product(&store, "Mug", 1_000).await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();

    let view = app
        .services
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
    let item_id = view.items[0].id;

    let view = app
        .services
        .carts
        .update_item_quantity(store.id, cart.id, item_id, 0)
        .await
        .unwrap();

    assert!(view.items.is_empty());
    assert_eq!(view.subtotal, 0);
}

#[tokio::test]
async fn clear_cart_removes_every_item_but_keeps_the_cart() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;
    let mug = app.seed_product(&store, "Mug", 1_000).await;
    let cap = app.seed_product(&store, "Cap", 2_500).await;

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();

    for product_id in [mug.id, cap.id] {
        app.services
            .carts
            .add_item(
                store.id,
                cart.id,
                AddToCartInput {
                    product_id,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
    }

    app.services.carts.clear_cart(store.id, cart.id).await.unwrap();

    let view = app.services.carts.get_cart(store.id, cart.id).await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.subtotal, 0);
}

#[tokio::test]
async fn add_item_rejects_products_from_other_stores() {
    let app = spawn_app().await;
    let store_a = app.seed_store("Alpha").await;
    let store_b = app.seed_store("Beta").await;
    let foreign = app.seed_product(&store_b, "Mug", 1_000).await;

    let cart = app
        .services
        .carts
        .create_cart(store_a.id, &store_a.currency, CreateCartInput::default())
        .await
        .unwrap();

    let err = app
        .services
        .carts
        .add_item(
            store_a.id,
            cart.id,
            AddToCartInput {
                product_id: foreign.id,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cart_lookup_is_scoped_by_store() {
    let app = spawn_app().await;
    let store_a = app.seed_store("Alpha").await;
    let store_b = app.seed_store("Beta").await;

    let cart = app
        .services
        .carts
        .create_cart(store_a.id, &store_a.currency, CreateCartInput::default())
        .await
        .unwrap();

    let err = app
        .services
        .carts
        .get_cart(store_b.id, cart.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn unknown_item_or_cart_is_not_found() {
    let app = spawn_app().await;
    let store = app.seed_store("Acme").await;

    let err = app
        .services
        .carts
        .get_cart(store.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let cart = app
        .services
        .carts
        .create_cart(store.id, &store.currency, CreateCartInput::default())
        .await
        .unwrap();

    let err = app
        .services
        .carts
        .update_item_quantity(store.id, cart.id, Uuid::new_v4(), 2)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn store_slugs_deduplicate_with_numeric_suffixes() {
    let app = spawn_app().await;

    let first = app.seed_store("Acme Outfitters").await;
    let second = app.seed_store("Acme Outfitters").await;
    let third = app.seed_store("Acme Outfitters").await;

    assert_eq!(first.slug, "acme-outfitters");
    assert_eq!(second.slug, "acme-outfitters-2");
    assert_eq!(third.slug, "acme-outfitters-3");

    // Slug lookup resolves the exact tenant
    let resolved = app
        .services
        .stores
        .get_by_slug("acme-outfitters-2")
        .await
        .unwrap();
    assert_eq!(resolved.id, second.id);
}

#[tokio::test]
async fn explicit_slugs_are_normalized() {
    let app = spawn_app().await;

    let store = app
        .services
        .stores
        .create_store(CreateStoreInput {
            name: "Fancy Shop".to_string(),
            slug: Some("  Fancy SHOP!  ".to_string()),
            currency: Some("eur".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(store.slug, "fancy-shop");
    assert_eq!(store.currency, "EUR");
}
