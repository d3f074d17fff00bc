use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront API

Multi-tenant storefront backend. Merchants create stores and manage
products, discounts, and orders; customers shop storefronts resolved per
store slug and confirm checkout against their cart.

## Checkout

`POST /api/v1/stores/{slug}/checkout` validates the cart, applies an
optional discount code, and records the order, payment, and cart clearing
as one atomic transaction. A declined payment rolls the whole attempt back
and surfaces as `402`.

## Rate Limiting

Requests are rate-limited per client. Check the response headers:
- `X-RateLimit-Limit`: Maximum requests per window
- `X-RateLimit-Remaining`: Remaining requests in the current window
- `X-RateLimit-Reset`: Seconds until the window resets
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Stores", description = "Tenant management endpoints"),
        (name = "Carts", description = "Storefront cart endpoints"),
        (name = "Checkout", description = "Checkout confirmation endpoints"),
        (name = "Discounts", description = "Discount management and preview endpoints")
    ),
    paths(
        crate::handlers::stores::create_store,
        crate::handlers::stores::get_store,
        crate::handlers::carts::get_cart,
        crate::handlers::checkout::confirm_checkout,
        crate::handlers::discounts::preview_discount,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::ListQuery,
            crate::handlers::stores::CreateStoreRequest,
            crate::handlers::checkout::ConfirmCheckoutRequest,
            crate::handlers::checkout::CheckoutResponse,
            crate::handlers::discounts::PreviewDiscountRequest,
            crate::services::payments::PaymentDetails,
            crate::services::payments::PaymentMethod,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/v1/stores/{slug}/checkout"));
    }
}
