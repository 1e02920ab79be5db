//! Stripe payment provider via REST API (no SDK dependency)

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use serde_json::Value;
use sha2::Sha256;

use shared::status::PaymentStatus;

use super::{PaymentError, PaymentGateway, PaymentIntent};

const API_BASE: &str = "https://api.stripe.com";

/// Reject webhook events older than 5 minutes to prevent replay attacks
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, secret_key: String, webhook_secret: String) -> Self {
        Self {
            client,
            secret_key,
            webhook_secret,
        }
    }

    /// Map a Stripe PaymentIntent status string to the normalized status space
    fn normalize_status(stripe_status: &str) -> PaymentStatus {
        match stripe_status {
            "succeeded" => PaymentStatus::Succeeded,
            "canceled" | "payment_failed" => PaymentStatus::Failed,
            _ => PaymentStatus::RequiresAction,
        }
    }

    /// Map a Stripe webhook event type to the normalized status space
    fn status_from_event(event_type: &str) -> PaymentStatus {
        match event_type {
            "payment_intent.succeeded" => PaymentStatus::Succeeded,
            "payment_intent.payment_failed" | "payment_intent.canceled" => PaymentStatus::Failed,
            _ => PaymentStatus::RequiresAction,
        }
    }

    /// Verify the Stripe-Signature header (HMAC-SHA256 over "timestamp.payload")
    fn verify_signature(&self, payload: &[u8], sig_header: &str) -> Result<(), PaymentError> {
        let mut timestamp = "";
        let mut signature = "";
        for part in sig_header.split(',') {
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = t;
            } else if let Some(v) = part.strip_prefix("v1=") {
                signature = v;
            }
        }

        if timestamp.is_empty() || signature.is_empty() {
            return Err(PaymentError::Signature);
        }

        let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| PaymentError::Signature)?;
        mac.update(signed_payload.as_bytes());

        // Constant-time comparison via hmac::verify_slice
        let sig_bytes = hex::decode(signature).map_err(|_| PaymentError::Signature)?;
        mac.verify_slice(&sig_bytes)
            .map_err(|_| PaymentError::Signature)?;

        let ts: i64 = timestamp.parse().map_err(|_| PaymentError::Signature)?;
        let now = chrono::Utc::now().timestamp();
        if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(PaymentError::Signature);
        }

        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount = amount_minor_units.to_string();
        let currency_lower = currency.to_lowercase();
        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), amount),
            ("currency".into(), currency_lower),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
        ];
        if let Some(meta) = metadata.as_object() {
            for (key, value) in meta {
                let value = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => value.to_string(),
                };
                form.push((format!("metadata[{key}]"), value));
            }
        }

        let mut request = self
            .client
            .post(format!("{API_BASE}/v1/payment_intents"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let resp: Value = request
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let intent_id = resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| PaymentError::Provider(format!("Stripe create intent failed: {resp}")))?;
        let status = Self::normalize_status(resp["status"].as_str().unwrap_or(""));
        let client_secret = resp["client_secret"].as_str().map(String::from);

        Ok(PaymentIntent {
            intent_id,
            status,
            client_secret,
            raw: resp,
        })
    }

    fn parse_webhook_payload(
        &self,
        raw_body: &[u8],
        headers: &HeaderMap,
    ) -> Result<Value, PaymentError> {
        let sig_header = headers
            .get("Stripe-Signature")
            .and_then(|v| v.to_str().ok())
            .ok_or(PaymentError::Signature)?;

        self.verify_signature(raw_body, sig_header)?;

        serde_json::from_slice(raw_body).map_err(|e| PaymentError::Payload(e.to_string()))
    }

    fn process_webhook(&self, payload: &Value) -> Result<PaymentIntent, PaymentError> {
        let event_type = payload
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::Payload("missing event type".into()))?;

        let object = &payload["data"]["object"];
        let intent_id = object
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::Payload("missing data.object.id".into()))?;

        Ok(PaymentIntent {
            intent_id: intent_id.to_string(),
            status: Self::status_from_event(event_type),
            client_secret: None,
            raw: payload.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> StripeGateway {
        StripeGateway::new(
            reqwest::Client::new(),
            "sk_test_x".into(),
            "whsec_test".into(),
        )
    }

    fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let signed = format!("{timestamp}.{}", std::str::from_utf8(body).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_signature_valid() {
        let gw = gateway();
        let body = br#"{"type":"payment_intent.succeeded"}"#;
        let ts = chrono::Utc::now().timestamp();
        let sig = sign("whsec_test", ts, body);
        let header = format!("t={ts},v1={sig}");

        assert!(gw.verify_signature(body, &header).is_ok());
    }

    #[test]
    fn test_signature_wrong_secret() {
        let gw = gateway();
        let body = br#"{"type":"payment_intent.succeeded"}"#;
        let ts = chrono::Utc::now().timestamp();
        let sig = sign("whsec_other", ts, body);
        let header = format!("t={ts},v1={sig}");

        assert!(matches!(
            gw.verify_signature(body, &header),
            Err(PaymentError::Signature)
        ));
    }

    #[test]
    fn test_signature_stale_timestamp() {
        let gw = gateway();
        let body = br#"{}"#;
        let ts = chrono::Utc::now().timestamp() - 600;
        let sig = sign("whsec_test", ts, body);
        let header = format!("t={ts},v1={sig}");

        assert!(matches!(
            gw.verify_signature(body, &header),
            Err(PaymentError::Signature)
        ));
    }

    #[test]
    fn test_signature_malformed_header() {
        let gw = gateway();
        assert!(matches!(
            gw.verify_signature(b"{}", "garbage"),
            Err(PaymentError::Signature)
        ));
    }

    #[test]
    fn test_parse_requires_signature_header() {
        let gw = gateway();
        let result = gw.parse_webhook_payload(b"{}", &HeaderMap::new());
        assert!(matches!(result, Err(PaymentError::Signature)));
    }

    #[test]
    fn test_event_type_mapping() {
        let gw = gateway();

        let payload = json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_123"}}
        });
        let intent = gw.process_webhook(&payload).unwrap();
        assert_eq!(intent.intent_id, "pi_123");
        assert_eq!(intent.status, PaymentStatus::Succeeded);

        let payload = json!({
            "type": "payment_intent.payment_failed",
            "data": {"object": {"id": "pi_123"}}
        });
        assert_eq!(
            gw.process_webhook(&payload).unwrap().status,
            PaymentStatus::Failed
        );

        let payload = json!({
            "type": "payment_intent.canceled",
            "data": {"object": {"id": "pi_123"}}
        });
        assert_eq!(
            gw.process_webhook(&payload).unwrap().status,
            PaymentStatus::Failed
        );

        let payload = json!({
            "type": "payment_intent.created",
            "data": {"object": {"id": "pi_123"}}
        });
        assert_eq!(
            gw.process_webhook(&payload).unwrap().status,
            PaymentStatus::RequiresAction
        );
    }

    #[test]
    fn test_process_webhook_missing_fields() {
        let gw = gateway();
        assert!(gw.process_webhook(&json!({})).is_err());
        assert!(
            gw.process_webhook(&json!({"type": "payment_intent.succeeded"}))
                .is_err()
        );
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(
            StripeGateway::normalize_status("succeeded"),
            PaymentStatus::Succeeded
        );
        assert_eq!(
            StripeGateway::normalize_status("canceled"),
            PaymentStatus::Failed
        );
        assert_eq!(
            StripeGateway::normalize_status("requires_payment_method"),
            PaymentStatus::RequiresAction
        );
        assert_eq!(
            StripeGateway::normalize_status("processing"),
            PaymentStatus::RequiresAction
        );
    }
}
