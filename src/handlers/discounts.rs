use crate::handlers::common::{created_response, resolve_store, success_response};
use crate::{
    errors::ServiceError,
    services::discounts::CreateDiscountInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for discount endpoints, nested under `/stores/:slug`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_discount).get(list_discounts))
        .route("/preview", post(preview_discount))
        .route("/:id", get(get_discount))
        .route("/:id/deactivate", post(deactivate_discount))
}

/// Create a discount code for a store
async fn create_discount(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<CreateDiscountInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let discount = state
        .services
        .discounts
        .create_discount(store.id, payload)
        .await?;

    Ok(created_response(discount))
}

/// List a store's discounts
async fn list_discounts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let discounts = state.services.discounts.list_discounts(store.id).await?;

    Ok(success_response(discounts))
}

/// Fetch one discount
async fn get_discount(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let discount = state.services.discounts.get_discount(store.id, id).await?;

    Ok(success_response(discount))
}

/// Deactivate a discount
async fn deactivate_discount(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let discount = state
        .services
        .discounts
        .deactivate_discount(store.id, id)
        .await?;

    Ok(success_response(discount))
}

/// Report the deduction a code would produce for a subtotal, without
/// redeeming anything.
#[utoipa::path(
    post,
    path = "/api/v1/stores/{slug}/discounts/preview",
    params(("slug" = String, Path, description = "Store slug")),
    request_body = PreviewDiscountRequest,
    responses(
        (status = 200, description = "Eligibility and deduction for the code"),
        (status = 404, description = "Unknown store", body = crate::errors::ErrorResponse)
    ),
    tag = "Discounts"
)]
pub async fn preview_discount(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<PreviewDiscountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let preview = state
        .services
        .discounts
        .preview(store.id, payload.code.as_deref(), payload.subtotal)
        .await?;

    Ok(success_response(preview))
}

// Request DTOs

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PreviewDiscountRequest {
    pub code: Option<String>,
    /// Subtotal in minor currency units
    pub subtotal: i64,
}
