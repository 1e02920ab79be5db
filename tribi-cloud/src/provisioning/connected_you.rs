//! ConnectedYou partner provisioning backend
//!
//! Builds the partner request from the order's plan snapshot and customer
//! identity. In dry-run mode (default until credentials and partner approval
//! exist) the request is built and logged but never sent; a synthetic result
//! comes back so the rest of the pipeline can be exercised end to end.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{
    DEFAULT_INSTRUCTIONS, EsimProvider, ProvisionRequest, ProvisioningError, ProvisioningResult,
};

pub struct ConnectedYouProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    partner_id: String,
    dry_run: bool,
}

impl ConnectedYouProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        partner_id: String,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            partner_id,
            dry_run,
        }
    }

    /// Build the partner request payload from the plan snapshot
    fn build_payload(&self, request: &ProvisionRequest) -> Value {
        let snapshot = &request.plan_snapshot;
        json!({
            "partnerId": self.partner_id,
            "orderRef": request.order_id.to_string(),
            "customerEmail": request.customer_email,
            "planName": snapshot.get("name").cloned().unwrap_or(Value::Null),
            "country": snapshot.get("country").cloned().unwrap_or(Value::Null),
            "carrier": snapshot.get("carrier").cloned().unwrap_or(Value::Null),
            "dataAmountMb": snapshot.get("data_amount_mb").cloned().unwrap_or(Value::Null),
            "durationDays": snapshot.get("duration_days").cloned().unwrap_or(Value::Null),
        })
    }

    fn dry_run_result(&self, request: &ProvisionRequest, payload: Value) -> ProvisioningResult {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let activation_code = format!("CNY-{}", &token[..12].to_uppercase());
        let iccid = format!("89{:017}", uuid::Uuid::new_v4().as_u128() % 10u128.pow(17));

        tracing::info!(
            order_id = request.order_id,
            %payload,
            "ConnectedYou dry run, returning synthetic eSIM"
        );

        ProvisioningResult {
            qr_payload: Some(format!("LPA:1$rsp.connectedyou.io${activation_code}")),
            activation_code,
            iccid: Some(iccid),
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
            provider_reference: Some(format!("dry-run-{}", request.order_id)),
            metadata: json!({"provider": "connected_you", "dry_run": true, "request": payload}),
        }
    }

    fn parse_response(&self, resp: Value) -> Result<ProvisioningResult, ProvisioningError> {
        let activation_code = resp
            .get("activationCode")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ProvisioningError::InvalidResponse("missing activationCode".into())
            })?
            .to_string();

        Ok(ProvisioningResult {
            activation_code,
            iccid: resp.get("iccid").and_then(|v| v.as_str()).map(String::from),
            qr_payload: resp
                .get("qrPayload")
                .and_then(|v| v.as_str())
                .map(String::from),
            instructions: resp
                .get("instructions")
                .and_then(|v| v.as_str())
                .map(String::from)
                .or_else(|| Some(DEFAULT_INSTRUCTIONS.to_string())),
            provider_reference: resp
                .get("reference")
                .and_then(|v| v.as_str())
                .map(String::from),
            metadata: json!({"provider": "connected_you", "response": resp}),
        })
    }
}

#[async_trait]
impl EsimProvider for ConnectedYouProvider {
    async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        let payload = self.build_payload(request);

        if self.dry_run {
            return Ok(self.dry_run_result(request, payload));
        }

        let resp = self
            .client
            .post(format!("{}/v1/esims/provision", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProvisioningError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProvisioningError::Network(format!(
                "ConnectedYou returned {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProvisioningError::InvalidResponse(e.to_string()))?;

        self.parse_response(body)
    }
}
