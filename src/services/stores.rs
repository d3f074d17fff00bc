use crate::{
    entities::{store, Store, StoreModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Store creation parameters. Omitting `slug` derives one from the name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStoreInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
}

/// Turns an arbitrary name into a URL-safe slug: lowercase, alphanumerics
/// kept, everything else collapsed into single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "store".to_string()
    } else {
        slug
    }
}

/// Tenant management: store creation with slug de-duplication and the
/// slug-based lookups storefront routes resolve first.
#[derive(Clone)]
pub struct StoreService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_currency: String,
}

impl StoreService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_currency,
        }
    }

    /// Creates a store. When the requested slug (or the one derived from the
    /// name) is taken, a numeric suffix is appended until a free one is
    /// found: `acme`, `acme-2`, `acme-3`, …
    #[instrument(skip(self, input))]
    pub async fn create_store(&self, input: CreateStoreInput) -> Result<StoreModel, ServiceError> {
        input.validate()?;

        let base_slug = slugify(input.slug.as_deref().unwrap_or(&input.name));
        let slug = self.dedupe_slug(&base_slug).await?;

        let store_id = Uuid::new_v4();
        let now = Utc::now();
        let model = store::ActiveModel {
            id: Set(store_id),
            slug: Set(slug),
            name: Set(input.name),
            currency: Set(input
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| self.default_currency.clone())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::StoreCreated(store_id))
            .await;

        info!("Created store {} ({})", created.slug, store_id);
        Ok(created)
    }

    /// Resolves a slug to an active store. Unknown or deactivated slugs are
    /// a 404 — this is the tenant-isolation boundary for storefront routes.
    pub async fn get_by_slug(&self, slug: &str) -> Result<StoreModel, ServiceError> {
        Store::find()
            .filter(store::Column::Slug.eq(slug))
            .filter(store::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", slug)))
    }

    /// Lists stores, newest first.
    pub async fn list_stores(&self) -> Result<Vec<StoreModel>, ServiceError> {
        let stores = Store::find()
            .order_by_desc(store::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(stores)
    }

    async fn dedupe_slug(&self, base: &str) -> Result<String, ServiceError> {
        let mut candidate = base.to_string();
        let mut suffix = 2u32;

        loop {
            let taken = Store::find()
                .filter(store::Column::Slug.eq(candidate.clone()))
                .one(&*self.db)
                .await?
                .is_some();

            if !taken {
                return Ok(candidate);
            }

            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }
}
