use crate::handlers::common::{
    created_response, no_content_response, resolve_store, success_response, validate_input,
};
use crate::{
    errors::ServiceError,
    services::carts::{AddToCartInput, CreateCartInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints, nested under `/stores/:slug`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route("/:id/items", post(add_to_cart))
        .route("/:id/items/:item_id", put(update_cart_item))
        .route("/:id/items/:item_id", delete(remove_cart_item))
        .route("/:id/clear", post(clear_cart))
}

/// Create a new cart
async fn create_cart(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<CreateCartRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;

    let input = CreateCartInput {
        session_id: payload.session_id,
        customer_id: payload.customer_id,
    };

    let cart = state
        .services
        .carts
        .create_cart(store.id, &store.currency, input)
        .await?;

    Ok(created_response(cart))
}

/// Get cart with items
#[utoipa::path(
    get,
    path = "/api/v1/stores/{slug}/carts/{id}",
    params(
        ("slug" = String, Path, description = "Store slug"),
        ("id" = Uuid, Path, description = "Cart id")
    ),
    responses(
        (status = 200, description = "Cart with items and subtotal"),
        (status = 404, description = "Unknown store or cart", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let cart_with_items = state.services.carts.get_cart(store.id, id).await?;

    Ok(success_response(cart_with_items))
}

/// Add item to cart
async fn add_to_cart(
    State(state): State<AppState>,
    Path((slug, cart_id)): Path<(String, Uuid)>,
    Json(payload): Json<AddToCartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let store = resolve_store(&state, &slug).await?;
    let cart = state
        .services
        .carts
        .add_item(store.id, cart_id, payload)
        .await?;

    Ok(success_response(cart))
}

/// Update cart item quantity
async fn update_cart_item(
    State(state): State<AppState>,
    Path((slug, cart_id, item_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let store = resolve_store(&state, &slug).await?;
    let cart = state
        .services
        .carts
        .update_item_quantity(store.id, cart_id, item_id, payload.quantity)
        .await?;

    Ok(success_response(cart))
}

/// Remove item from cart
async fn remove_cart_item(
    State(state): State<AppState>,
    Path((slug, cart_id, item_id)): Path<(String, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    state
        .services
        .carts
        .update_item_quantity(store.id, cart_id, item_id, 0)
        .await?;

    Ok(no_content_response())
}

/// Clear all items from cart
async fn clear_cart(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    state.services.carts.clear_cart(store.id, id).await?;

    Ok(success_response(serde_json::json!({
        "message": "Cart cleared successfully"
    })))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct CreateCartRequest {
    pub session_id: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 0))]
    pub quantity: i32,
}
