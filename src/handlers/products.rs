use crate::handlers::common::{created_response, resolve_store, success_response};
use crate::{
    errors::ServiceError,
    services::products::CreateProductInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for catalog endpoints, nested under `/stores/:slug`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
}

/// Create a product for a store
async fn create_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let product = state
        .services
        .products
        .create_product(store.id, payload)
        .await?;

    Ok(created_response(product))
}

/// List a store's products
async fn list_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let products = state.services.products.list_products(store.id).await?;

    Ok(success_response(products))
}

/// Fetch one product
async fn get_product(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = resolve_store(&state, &slug).await?;
    let product = state.services.products.get_product(store.id, id).await?;

    Ok(success_response(product))
}
