//! Payment endpoints
//!
//! POST /api/payments/create            — create a payment intent
//! POST /api/payments/webhook?provider= — provider webhook (raw body)

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use shared::error::ApiResponse;

use crate::auth::UserIdentity;
use crate::error::ServiceResult;
use crate::services::payments;
use crate::state::AppState;

use super::esims::parse_id;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentCreatedResponse {
    pub intent_id: String,
    pub status: String,
    pub provider: String,
    pub amount_minor_units: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
}

/// POST /api/payments/create
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(body): Json<CreatePaymentRequest>,
) -> ServiceResult<Json<ApiResponse<PaymentCreatedResponse>>> {
    let order_id = parse_id(&body.order_id)?;
    let created = payments::create_payment(&state, &user, order_id, body.provider).await?;

    Ok(Json(ApiResponse::success(PaymentCreatedResponse {
        intent_id: created.intent_id,
        status: created.status.as_db().to_string(),
        provider: created.provider.as_db().to_string(),
        amount_minor_units: created.amount_minor_units,
        currency: created.currency,
        client_secret: created.client_secret,
        publishable_key: created.publishable_key,
    })))
}

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub intent_status: String,
}

/// POST /api/payments/webhook?provider=
///
/// Must receive the raw body (not JSON) for signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ServiceResult<Json<ApiResponse<WebhookResponse>>> {
    let outcome = payments::reconcile_webhook(&state, &query.provider, &body, &headers).await?;

    tracing::info!(
        intent_id = %outcome.intent_id,
        intent_status = outcome.intent_status.as_db(),
        transitioned = outcome.transitioned,
        "Processed payment webhook"
    );

    Ok(Json(ApiResponse::success(WebhookResponse {
        status: "processed",
        intent_status: outcome.intent_status.as_db().to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(client_secret: Option<&str>, publishable_key: Option<&str>) -> PaymentCreatedResponse {
        PaymentCreatedResponse {
            intent_id: "pi_123".into(),
            status: "requires_action".into(),
            provider: "STRIPE".into(),
            amount_minor_units: 1250,
            currency: "USD".into(),
            client_secret: client_secret.map(String::from),
            publishable_key: publishable_key.map(String::from),
        }
    }

    #[test]
    fn test_client_keys_serialized_together() {
        let json =
            serde_json::to_value(response(Some("pi_123_secret"), Some("pk_test_123"))).unwrap();
        assert_eq!(json["client_secret"], "pi_123_secret");
        assert_eq!(json["publishable_key"], "pk_test_123");
    }

    #[test]
    fn test_absent_client_keys_omitted() {
        let json = serde_json::to_value(response(None, None)).unwrap();
        assert!(json.get("client_secret").is_none());
        assert!(json.get("publishable_key").is_none());
    }
}
