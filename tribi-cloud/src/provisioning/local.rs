//! Local synthetic provisioning backend
//!
//! Generates unique-looking activation material with no network call.
//! Suitable for development and for environments without a partner contract.

use async_trait::async_trait;
use serde_json::json;

use super::{
    DEFAULT_INSTRUCTIONS, EsimProvider, ProvisionRequest, ProvisioningError, ProvisioningResult,
};

pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EsimProvider for LocalProvider {
    async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let activation_code = format!("LOCAL-{}", &token[..16].to_uppercase());
        // 19-digit ICCID in the 89 (telecom) prefix range
        let iccid = format!("89{:017}", uuid::Uuid::new_v4().as_u128() % 10u128.pow(17));
        let qr_payload = format!("LPA:1$local.tribi.dev${activation_code}");

        tracing::info!(order_id = request.order_id, "Provisioned local eSIM");

        Ok(ProvisioningResult {
            activation_code,
            iccid: Some(iccid),
            qr_payload: Some(qr_payload),
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
            provider_reference: None,
            metadata: json!({"provider": "local", "order_id": request.order_id}),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            order_id: 1,
            customer_email: "traveler@example.com".into(),
            plan_snapshot: json!({"name": "Japan 5GB"}),
        }
    }

    #[tokio::test]
    async fn test_provision_shape() {
        let provider = LocalProvider::new();
        let result = provider.provision(&request()).await.unwrap();

        assert!(result.activation_code.starts_with("LOCAL-"));
        let iccid = result.iccid.unwrap();
        assert!(iccid.starts_with("89"));
        assert_eq!(iccid.len(), 19);
        assert!(iccid.chars().all(|c| c.is_ascii_digit()));
        assert!(result.qr_payload.unwrap().starts_with("LPA:1$"));
        assert!(result.instructions.is_some());
    }

    #[tokio::test]
    async fn test_provision_unique_codes() {
        let provider = LocalProvider::new();
        let a = provider.provision(&request()).await.unwrap();
        let b = provider.provision(&request()).await.unwrap();
        assert_ne!(a.activation_code, b.activation_code);
        assert_ne!(a.iccid, b.iccid);
    }
}
