pub mod carts;
pub mod checkout;
pub mod common;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod stores;

use crate::config::AppConfig;
use crate::db::{DbPool, Transactor};
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub stores: Arc<crate::services::stores::StoreService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub carts: Arc<crate::services::carts::CartService>,
    pub discounts: Arc<crate::services::discounts::DiscountService>,
    pub checkout: Arc<crate::services::checkout::CheckoutService>,
    pub orders: Arc<crate::services::orders::OrderService>,
}

impl AppServices {
    /// Build the service container shared by all handlers.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let stores = Arc::new(crate::services::stores::StoreService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.default_currency.clone(),
        ));
        let products = Arc::new(crate::services::products::ProductService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let carts = Arc::new(crate::services::carts::CartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let discounts = Arc::new(crate::services::discounts::DiscountService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(crate::services::checkout::CheckoutService::new(
            Transactor::new(db_pool.clone()),
            event_sender.clone(),
            config.payment_provider.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool,
            event_sender,
        ));

        Self {
            stores,
            products,
            carts,
            discounts,
            checkout,
            orders,
        }
    }
}
