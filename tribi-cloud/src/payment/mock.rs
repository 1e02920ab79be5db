//! Mock payment provider
//!
//! Returns `requires_action` immediately on intent creation; status only
//! moves when a synthetic webhook is delivered. No signature on the webhook
//! path, so tests can post plain JSON.

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::{Value, json};

use shared::status::PaymentStatus;

use super::{PaymentError, PaymentGateway, PaymentIntent};

pub struct MockGateway;

impl MockGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: &Value,
        _idempotency_key: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let intent_id = format!("mock_pi_{}", uuid::Uuid::new_v4().simple());
        let raw = json!({
            "id": intent_id,
            "amount": amount_minor_units,
            "currency": currency,
            "metadata": metadata,
            "status": "requires_action",
        });

        Ok(PaymentIntent {
            client_secret: Some(format!("{intent_id}_secret")),
            intent_id,
            status: PaymentStatus::RequiresAction,
            raw,
        })
    }

    fn parse_webhook_payload(
        &self,
        raw_body: &[u8],
        _headers: &HeaderMap,
    ) -> Result<Value, PaymentError> {
        serde_json::from_slice(raw_body).map_err(|e| PaymentError::Payload(e.to_string()))
    }

    fn process_webhook(&self, payload: &Value) -> Result<PaymentIntent, PaymentError> {
        let intent_id = payload
            .get("intent_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::Payload("missing intent_id".into()))?;

        let status = match payload.get("status").and_then(|v| v.as_str()) {
            Some("succeeded") => PaymentStatus::Succeeded,
            Some("failed") => PaymentStatus::Failed,
            _ => PaymentStatus::RequiresAction,
        };

        Ok(PaymentIntent {
            intent_id: intent_id.to_string(),
            status,
            client_secret: None,
            raw: payload.clone(),
        })
    }
}
