use crate::handlers::common::resolve_store;
use crate::{
    entities::{OrderItemModel, OrderModel, PaymentStatus},
    errors::ServiceError,
    services::checkout::ConfirmCheckoutInput,
    services::payments::PaymentDetails,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Creates the router for checkout endpoints, nested under `/stores/:slug`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(confirm_checkout))
}

/// Confirm checkout: validate the cart, apply the optional discount code,
/// and atomically record the order, payment, and cart clearing.
#[utoipa::path(
    post,
    path = "/api/v1/stores/{slug}/checkout",
    params(("slug" = String, Path, description = "Store slug")),
    request_body = ConfirmCheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Invalid or empty cart", body = crate::errors::ErrorResponse),
        (status = 402, description = "Payment declined", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown store or cart", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn confirm_checkout(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<ConfirmCheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;

    let input = ConfirmCheckoutInput {
        cart_id: payload.cart_id,
        discount_code: payload.discount_code,
        customer_id: payload.customer_id,
        payment: payload.payment,
    };

    let outcome = state.services.checkout.confirm(&store, input).await?;

    let response = CheckoutResponse {
        success: true,
        order: outcome.order,
        items: outcome.items,
        payment_status: outcome.payment.status,
        message: "Order created".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ConfirmCheckoutRequest {
    pub cart_id: Uuid,
    pub discount_code: Option<String>,
    pub customer_id: Option<Uuid>,
    pub payment: PaymentDetails,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CheckoutResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub order: OrderModel,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<OrderItemModel>,
    #[schema(value_type = String)]
    pub payment_status: PaymentStatus,
    pub message: String,
}
