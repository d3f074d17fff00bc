use crate::{entities::StoreModel, errors::ServiceError, ApiResponse, AppState};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

/// Standard success response wrapped in the shared envelope
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response wrapped in the shared envelope
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no-content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))
}

/// Resolves a store slug to its row. Storefront handlers call this first;
/// everything after is scoped by the resolved `store.id`.
pub async fn resolve_store(state: &AppState, slug: &str) -> Result<StoreModel, ServiceError> {
    state.services.stores.get_by_slug(slug).await
}
