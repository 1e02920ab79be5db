//! eSIM provisioning provider abstraction
//!
//! Used when the inventory pool has no matching slot. Two implementations:
//! [`local::LocalProvider`] synthesizes activation material with no external
//! call, [`connected_you::ConnectedYouProvider`] integrates the partner API
//! with a dry-run mode for pre-credential environments.

pub mod connected_you;
pub mod local;

use async_trait::async_trait;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// Default install instructions shown when a provider returns none
pub const DEFAULT_INSTRUCTIONS: &str =
    "Scan the QR code from Settings > Cellular > Add eSIM, then enable data roaming for the new line.";

/// What the order pipeline needs to hand to a provisioning backend
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub order_id: i64,
    pub customer_email: String,
    /// The order's immutable plan snapshot
    pub plan_snapshot: Value,
}

/// Activation material returned by a provisioning backend
#[derive(Debug, Clone)]
pub struct ProvisioningResult {
    pub activation_code: String,
    pub iccid: Option<String>,
    pub qr_payload: Option<String>,
    pub instructions: Option<String>,
    pub provider_reference: Option<String>,
    /// Provider payload persisted for audit
    pub metadata: Value,
}

/// Typed failures from a provisioning backend
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// Backend unreachable or returned a transport-level error
    #[error("provisioning request failed: {0}")]
    Network(String),
    /// Backend responded but the payload is unusable
    #[error("provisioning response invalid: {0}")]
    InvalidResponse(String),
}

/// Uniform interface over eSIM provisioning backends
#[async_trait]
pub trait EsimProvider: Send + Sync {
    async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisioningResult, ProvisioningError>;
}

/// Build the provider named in configuration
pub fn provider_for(state: &AppState) -> Result<Box<dyn EsimProvider>, AppError> {
    match state.config.esim_provider.as_str() {
        "LOCAL" => Ok(Box::new(local::LocalProvider::new())),
        "CONNECTED_YOU" => Ok(Box::new(connected_you::ConnectedYouProvider::new(
            state.http.clone(),
            state.config.connected_you_base_url.clone(),
            state.config.connected_you_api_key.clone(),
            state.config.connected_you_partner_id.clone(),
            state.config.connected_you_dry_run,
        ))),
        other => Err(AppError::with_message(
            ErrorCode::ConfigError,
            format!("Unknown eSIM provider: {other}"),
        )),
    }
}
