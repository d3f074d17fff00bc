//! Shared harness for integration tests: an in-memory SQLite database with
//! migrations applied and the full service container wired up.

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use storefront_api::{
    config::AppConfig,
    entities::{DiscountKind, DiscountModel, ProductModel, StoreModel},
    events::{Event, EventSender},
    handlers::AppServices,
    migrator::Migrator,
    services::{
        discounts::CreateDiscountInput, products::CreateProductInput, stores::CreateStoreInput,
    },
};
use tokio::sync::mpsc;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    // Held so fire-and-forget sends have a live channel during the test
    #[allow(dead_code)]
    pub events: mpsc::Receiver<Event>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        redis_url: "redis://127.0.0.1:6379".into(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "development".into(),
        log_level: "debug".into(),
        log_json: false,
        auto_migrate: true,
        default_currency: "USD".into(),
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        cors_allow_credentials: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
        rate_limit_requests_per_window: 1000,
        rate_limit_window_seconds: 60,
        rate_limit_enable_headers: true,
        rate_limit_path_policies: None,
        rate_limit_use_redis: false,
        rate_limit_namespace: "storefront:rl".into(),
        payment_provider: "manual".into(),
        event_channel_capacity: 64,
    }
}

pub async fn spawn_app() -> TestApp {
    // A single connection keeps every query on the same in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("sqlite connection");
    Migrator::up(&db, None).await.expect("migrations");

    let db = Arc::new(db);
    let (tx, rx) = mpsc::channel(256);
    let event_sender = Arc::new(EventSender::new(tx));
    let services = AppServices::new(db.clone(), event_sender, &test_config());

    TestApp {
        db,
        services,
        events: rx,
    }
}

impl TestApp {
    pub async fn seed_store(&self, name: &str) -> StoreModel {
        self.services
            .stores
            .create_store(CreateStoreInput {
                name: name.to_string(),
                slug: None,
                currency: None,
            })
            .await
            .expect("store created")
    }

    pub async fn seed_product(&self, store: &StoreModel, name: &str, price: i64) -> ProductModel {
        self.services
            .products
            .create_product(
                store.id,
                CreateProductInput {
                    name: name.to_string(),
                    sku: None,
                    price,
                },
            )
            .await
            .expect("product created")
    }

    pub async fn seed_discount(
        &self,
        store: &StoreModel,
        code: &str,
        kind: DiscountKind,
        value: i64,
    ) -> DiscountModel {
        self.seed_discount_with(store, code, kind, value, |input| input)
            .await
    }

    pub async fn seed_discount_with(
        &self,
        store: &StoreModel,
        code: &str,
        kind: DiscountKind,
        value: i64,
        customize: impl FnOnce(CreateDiscountInput) -> CreateDiscountInput,
    ) -> DiscountModel {
        let input = customize(CreateDiscountInput {
            code: code.to_string(),
            kind,
            value,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            min_order_amount: None,
            max_discount_amount: None,
        });

        self.services
            .discounts
            .create_discount(store.id, input)
            .await
            .expect("discount created")
    }
}
