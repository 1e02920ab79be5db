//! Payment gateway abstraction
//!
//! Two implementations: [`mock::MockGateway`] for deterministic development
//! and tests, and [`stripe::StripeGateway`] over the Stripe REST API. Both
//! normalize provider status strings into [`PaymentStatus`] so the rest of
//! the pipeline never sees provider-specific vocabulary.

pub mod mock;
pub mod stripe;

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::Value;
use shared::status::{PaymentStatus, ProviderKind};

use crate::state::AppState;

/// A normalized payment intent as seen by the order pipeline
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Provider-assigned intent ID, globally unique
    pub intent_id: String,
    pub status: PaymentStatus,
    /// Client-side confirmation secret, when the provider issues one
    pub client_secret: Option<String>,
    /// Raw provider payload, persisted for audit
    pub raw: Value,
}

/// Typed failures from a payment provider
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Provider unreachable or rejected the request
    #[error("payment provider call failed: {0}")]
    Provider(String),
    /// Webhook signature missing, malformed, or failed verification
    #[error("webhook signature missing or invalid")]
    Signature,
    /// Webhook payload could not be interpreted
    #[error("webhook payload malformed: {0}")]
    Payload(String),
}

/// Uniform interface over payment providers
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for the given minor-unit amount
    async fn create_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Verify webhook authenticity and parse the raw body.
    ///
    /// Fails closed: a missing or invalid signature rejects the delivery
    /// before any state is touched.
    fn parse_webhook_payload(&self, raw_body: &[u8], headers: &HeaderMap)
    -> Result<Value, PaymentError>;

    /// Interpret a verified webhook payload as a normalized intent
    fn process_webhook(&self, payload: &Value) -> Result<PaymentIntent, PaymentError>;
}

/// Build the gateway for a provider kind
pub fn gateway_for(kind: ProviderKind, state: &AppState) -> Box<dyn PaymentGateway> {
    match kind {
        ProviderKind::Mock => Box::new(mock::MockGateway::new()),
        ProviderKind::Stripe => Box::new(stripe::StripeGateway::new(
            state.http.clone(),
            state.config.stripe_secret_key.clone(),
            state.config.stripe_webhook_secret.clone(),
        )),
    }
}
