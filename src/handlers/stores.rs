use crate::handlers::common::{created_response, success_response};
use crate::{
    errors::ServiceError,
    services::stores::CreateStoreInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

/// Creates the router for store endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_store).get(list_stores))
        .route("/:slug", get(get_store))
}

/// Create a new store (tenant). The slug is de-duplicated automatically.
#[utoipa::path(
    post,
    path = "/api/v1/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "Stores"
)]
pub async fn create_store(
    State(state): State<AppState>,
    Json(payload): Json<CreateStoreInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = state.services.stores.create_store(payload).await?;

    Ok(created_response(store))
}

/// List stores
async fn list_stores(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let stores = state.services.stores.list_stores().await?;

    Ok(success_response(stores))
}

/// Fetch one store by slug
#[utoipa::path(
    get,
    path = "/api/v1/stores/{slug}",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Store found"),
        (status = 404, description = "Unknown store", body = crate::errors::ErrorResponse)
    ),
    tag = "Stores"
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = state.services.stores.get_by_slug(&slug).await?;

    Ok(success_response(store))
}

/// Request body documented for OpenAPI; deserialization happens through
/// `CreateStoreInput` directly.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct CreateStoreRequest {
    pub name: String,
    pub slug: Option<String>,
    pub currency: Option<String>,
}
