use crate::{
    entities::{product, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

/// Product creation parameters; `price` is minor currency units.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
}

/// The slice of catalog management checkout depends on.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        store_id: Uuid,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let product_id = Uuid::new_v4();
        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(product_id),
            store_id: Set(store_id),
            name: Set(input.name),
            sku: Set(input.sku),
            price: Set(input.price),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        Ok(created)
    }

    pub async fn list_products(&self, store_id: Uuid) -> Result<Vec<ProductModel>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::StoreId.eq(store_id))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(products)
    }

    pub async fn get_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}
