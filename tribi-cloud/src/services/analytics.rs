//! Fire-and-forget analytics events
//!
//! Recording is best-effort: a failed insert is logged and never fails the
//! operation that emitted it.

use serde_json::Value;
use sqlx::PgPool;

use crate::db;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsEventType {
    CheckoutStarted,
    PurchaseCompleted,
    EsimActivated,
}

impl AnalyticsEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutStarted => "checkout_started",
            Self::PurchaseCompleted => "purchase_completed",
            Self::EsimActivated => "esim_activated",
        }
    }
}

/// Record one analytics event, swallowing (but logging) any failure
pub async fn record_event(
    pool: &PgPool,
    user_id: Option<i64>,
    event_type: AnalyticsEventType,
    payload: Value,
) {
    if let Err(e) = db::analytics::insert_event(pool, user_id, event_type.as_str(), &payload).await
    {
        tracing::warn!(
            event_type = event_type.as_str(),
            error = %e,
            "Failed to record analytics event"
        );
    }
}
