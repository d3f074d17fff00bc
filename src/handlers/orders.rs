use crate::handlers::common::{resolve_store, success_response};
use crate::{
    entities::OrderStatus,
    errors::ServiceError,
    AppState, ListQuery,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for order endpoints, nested under `/stores/:slug`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/payments", get(list_order_payments))
}

/// List a store's orders
async fn list_orders(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let page = state
        .services
        .orders
        .list_orders(store.id, query.page, query.limit)
        .await?;

    Ok(success_response(page))
}

/// Fetch one order with items
async fn get_order(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let order = state.services.orders.get_order(store.id, id).await?;

    Ok(success_response(order))
}

/// Move an order along its status lifecycle
async fn update_order_status(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let order = state
        .services
        .orders
        .update_status(store.id, id, payload.status)
        .await?;

    Ok(success_response(order))
}

/// Cancel an order
async fn cancel_order(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let order = state.services.orders.cancel_order(store.id, id).await?;

    Ok(success_response(order))
}

/// List payment attempts for an order
async fn list_order_payments(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let payments = state.services.orders.list_payments(store.id, id).await?;

    Ok(success_response(payments))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}
