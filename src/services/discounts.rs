use crate::{
    entities::{discount, Discount, DiscountKind, DiscountModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// A discount that passed every eligibility check for a given subtotal,
/// together with the deduction it produces.
#[derive(Debug, Clone)]
pub struct AppliedDiscount {
    pub discount: DiscountModel,
    pub deduction: i64,
}

/// Normalizes a raw code: trim + ASCII uppercase. Returns `None` for codes
/// that are empty after trimming, which callers treat as "no discount"
/// without a lookup.
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}

/// Computes the deduction a discount produces for `subtotal`, in minor
/// currency units. Pure arithmetic; eligibility is checked separately.
///
/// - fixed: `min(value, subtotal)`
/// - percentage: `round_half_up(subtotal * min(value, 100) / 100)`, then
///   capped by `max_discount_amount` when set
///
/// The result never exceeds the subtotal, so the net total never goes
/// negative.
pub fn deduction_for(discount: &DiscountModel, subtotal: i64) -> i64 {
    if subtotal <= 0 {
        return 0;
    }

    let raw = match discount.kind {
        DiscountKind::Fixed => discount.value.max(0),
        DiscountKind::Percentage => {
            let pct = discount.value.clamp(0, 100);
            // round-half-up without leaving integer arithmetic
            let scaled = i128::from(subtotal) * i128::from(pct) + 50;
            let mut deduction = (scaled / 100) as i64;
            if let Some(cap) = discount.max_discount_amount {
                deduction = deduction.min(cap.max(0));
            }
            deduction
        }
    };

    raw.min(subtotal)
}

/// Whether the discount is redeemable right now for the given subtotal.
/// Checks run in order: active flag, validity window, usage limit, minimum
/// order amount. Each failure is logged at debug level and short-circuits.
fn is_eligible(discount: &DiscountModel, now: DateTime<Utc>, subtotal: i64) -> bool {
    if !discount.is_active {
        debug!(code = %discount.code, "discount is inactive");
        return false;
    }

    if let Some(starts_at) = discount.starts_at {
        if now < starts_at {
            debug!(code = %discount.code, "discount window has not started");
            return false;
        }
    }

    if let Some(expires_at) = discount.expires_at {
        if now > expires_at {
            debug!(code = %discount.code, "discount window has expired");
            return false;
        }
    }

    if let Some(limit) = discount.usage_limit {
        if discount.used_count >= limit {
            warn!(code = %discount.code, "discount has reached its usage limit");
            return false;
        }
    }

    if let Some(min_amount) = discount.min_order_amount {
        if subtotal < min_amount {
            debug!(
                code = %discount.code,
                subtotal,
                min_amount,
                "subtotal below minimum order amount"
            );
            return false;
        }
    }

    true
}

/// Looks up a discount code for a store and evaluates eligibility for the
/// given subtotal. `None` code, unknown code, or any failed eligibility
/// check all resolve to `Ok(None)` — the expected "no discount" path, never
/// an error. A discount whose deduction works out to zero is also treated
/// as not applied.
pub async fn find_eligible<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    code: Option<&str>,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<Option<AppliedDiscount>, ServiceError> {
    let Some(code) = code.and_then(normalize_code) else {
        return Ok(None);
    };

    let Some(discount) = Discount::find()
        .filter(discount::Column::StoreId.eq(store_id))
        .filter(discount::Column::Code.eq(code))
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    if !is_eligible(&discount, now, subtotal) {
        return Ok(None);
    }

    let deduction = deduction_for(&discount, subtotal);
    if deduction == 0 {
        return Ok(None);
    }

    Ok(Some(AppliedDiscount {
        discount,
        deduction,
    }))
}

/// Redeems a discount with one atomic conditional update:
/// the usage counter is incremented only while the discount is active and
/// still under its limit, so two concurrent redemptions at the limit
/// boundary cannot both succeed. Returns `false` when the row lost the race
/// (or was deactivated meanwhile); the caller then proceeds without a
/// deduction.
pub async fn redeem<C: ConnectionTrait>(
    conn: &C,
    discount_id: Uuid,
) -> Result<bool, ServiceError> {
    let result = Discount::update_many()
        .col_expr(
            discount::Column::UsedCount,
            Expr::col(discount::Column::UsedCount).add(1),
        )
        .col_expr(discount::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(discount::Column::Id.eq(discount_id))
        .filter(discount::Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(discount::Column::UsageLimit.is_null())
                .add(
                    Expr::col(discount::Column::UsedCount)
                        .lt(Expr::col(discount::Column::UsageLimit)),
                ),
        )
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Input for creating a discount.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDiscountInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub kind: DiscountKind,
    #[validate(range(min = 1))]
    pub value: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1))]
    pub min_order_amount: Option<i64>,
    #[validate(range(min = 1))]
    pub max_discount_amount: Option<i64>,
}

/// Result of previewing a code against a subtotal.
#[derive(Debug, Serialize)]
pub struct DiscountPreview {
    pub eligible: bool,
    pub deduction: i64,
}

/// Merchant-facing discount management plus the storefront preview.
#[derive(Clone)]
pub struct DiscountService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DiscountService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a discount for a store. The code is stored normalized and
    /// must be unique within the store.
    #[instrument(skip(self, input))]
    pub async fn create_discount(
        &self,
        store_id: Uuid,
        input: CreateDiscountInput,
    ) -> Result<DiscountModel, ServiceError> {
        input.validate()?;

        let code = normalize_code(&input.code)
            .ok_or_else(|| ServiceError::ValidationError("Discount code is empty".to_string()))?;

        if input.kind == DiscountKind::Percentage && input.value > 100 {
            return Err(ServiceError::ValidationError(
                "Percentage discounts cannot exceed 100".to_string(),
            ));
        }

        if let (Some(starts_at), Some(expires_at)) = (input.starts_at, input.expires_at) {
            if expires_at <= starts_at {
                return Err(ServiceError::ValidationError(
                    "Discount window must end after it starts".to_string(),
                ));
            }
        }

        let existing = Discount::find()
            .filter(discount::Column::StoreId.eq(store_id))
            .filter(discount::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Discount code {} already exists for this store",
                code
            )));
        }

        let discount_id = Uuid::new_v4();
        let now = Utc::now();
        let model = discount::ActiveModel {
            id: Set(discount_id),
            store_id: Set(store_id),
            code: Set(code),
            kind: Set(input.kind),
            value: Set(input.value),
            starts_at: Set(input.starts_at),
            expires_at: Set(input.expires_at),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            min_order_amount: Set(input.min_order_amount),
            max_discount_amount: Set(input.max_discount_amount),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let discount = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DiscountCreated(discount_id))
            .await;

        Ok(discount)
    }

    /// Lists a store's discounts, newest first.
    pub async fn list_discounts(&self, store_id: Uuid) -> Result<Vec<DiscountModel>, ServiceError> {
        let discounts = Discount::find()
            .filter(discount::Column::StoreId.eq(store_id))
            .order_by_desc(discount::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(discounts)
    }

    pub async fn get_discount(
        &self,
        store_id: Uuid,
        discount_id: Uuid,
    ) -> Result<DiscountModel, ServiceError> {
        Discount::find()
            .filter(discount::Column::Id.eq(discount_id))
            .filter(discount::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Discount {} not found", discount_id)))
    }

    /// Deactivates a discount; existing orders keep their recorded deduction.
    #[instrument(skip(self))]
    pub async fn deactivate_discount(
        &self,
        store_id: Uuid,
        discount_id: Uuid,
    ) -> Result<DiscountModel, ServiceError> {
        let discount = self.get_discount(store_id, discount_id).await?;

        let mut active: discount::ActiveModel = discount.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        let discount = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DiscountDeactivated(discount_id))
            .await;

        Ok(discount)
    }

    /// Reports the deduction a code would produce for a subtotal, without
    /// redeeming anything.
    pub async fn preview(
        &self,
        store_id: Uuid,
        code: Option<&str>,
        subtotal: i64,
    ) -> Result<DiscountPreview, ServiceError> {
        let applied = find_eligible(&*self.db, store_id, code, subtotal, Utc::now()).await?;

        Ok(match applied {
            Some(applied) => DiscountPreview {
                eligible: true,
                deduction: applied.deduction,
            },
            None => DiscountPreview {
                eligible: false,
                deduction: 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount(kind: DiscountKind, value: i64) -> DiscountModel {
        DiscountModel {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            code: "SAVE20".to_string(),
            kind,
            value,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
            min_order_amount: None,
            max_discount_amount: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  save20 "), Some("SAVE20".to_string()));
        assert_eq!(normalize_code("FLAT500"), Some("FLAT500".to_string()));
        assert_eq!(normalize_code("   "), None);
        assert_eq!(normalize_code(""), None);
    }

    #[test]
    fn percentage_deduction() {
        // 10000 at 20% -> 2000
        let d = discount(DiscountKind::Percentage, 20);
        assert_eq!(deduction_for(&d, 10_000), 2_000);
    }

    #[test]
    fn percentage_deduction_respects_cap() {
        let mut d = discount(DiscountKind::Percentage, 20);
        d.max_discount_amount = Some(1_500);
        assert_eq!(deduction_for(&d, 10_000), 1_500);
    }

    #[test]
    fn percentage_value_is_clamped_to_100() {
        let d = discount(DiscountKind::Percentage, 250);
        assert_eq!(deduction_for(&d, 10_000), 10_000);
    }

    #[test]
    fn percentage_rounds_half_up() {
        // 150 at 5% = 7.5 -> 8
        let d = discount(DiscountKind::Percentage, 5);
        assert_eq!(deduction_for(&d, 150), 8);
        // 149 at 5% = 7.45 -> 7
        assert_eq!(deduction_for(&d, 149), 7);
    }

    #[test]
    fn fixed_deduction_is_capped_at_subtotal() {
        let d = discount(DiscountKind::Fixed, 500);
        assert_eq!(deduction_for(&d, 10_000), 500);
        // FLAT500 against a 300 subtotal deducts only 300
        assert_eq!(deduction_for(&d, 300), 300);
    }

    #[test]
    fn zero_subtotal_never_deducts() {
        let d = discount(DiscountKind::Fixed, 500);
        assert_eq!(deduction_for(&d, 0), 0);

        let d = discount(DiscountKind::Percentage, 50);
        assert_eq!(deduction_for(&d, 0), 0);
    }

    #[test]
    fn future_start_is_ineligible() {
        let mut d = discount(DiscountKind::Percentage, 20);
        d.starts_at = Some(Utc::now() + Duration::days(1));
        assert!(!is_eligible(&d, Utc::now(), 10_000));
    }

    #[test]
    fn past_expiry_is_ineligible() {
        let mut d = discount(DiscountKind::Percentage, 20);
        d.expires_at = Some(Utc::now() - Duration::days(1));
        assert!(!is_eligible(&d, Utc::now(), 10_000));
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let now = Utc::now();
        let mut d = discount(DiscountKind::Percentage, 20);
        d.starts_at = Some(now);
        d.expires_at = Some(now);
        assert!(is_eligible(&d, now, 10_000));
    }

    #[test]
    fn usage_limit_exhausted_is_ineligible() {
        let mut d = discount(DiscountKind::Percentage, 20);
        d.usage_limit = Some(5);
        d.used_count = 5;
        assert!(!is_eligible(&d, Utc::now(), 10_000));

        d.used_count = 4;
        assert!(is_eligible(&d, Utc::now(), 10_000));
    }

    #[test]
    fn subtotal_below_minimum_is_ineligible() {
        let mut d = discount(DiscountKind::Percentage, 20);
        d.min_order_amount = Some(5_000);
        assert!(!is_eligible(&d, Utc::now(), 4_999));
        assert!(is_eligible(&d, Utc::now(), 5_000));
    }

    #[test]
    fn inactive_discount_is_ineligible() {
        let mut d = discount(DiscountKind::Percentage, 20);
        d.is_active = false;
        assert!(!is_eligible(&d, Utc::now(), 10_000));
    }
}
