//! Payment intent creation and webhook reconciliation
//!
//! Reconciliation is the only code that mutates payment and order status,
//! and it only ever moves forward: webhook redelivery and out-of-order
//! events become no-ops instead of overwrites.

use serde_json::json;

use http::HeaderMap;
use shared::error::{AppError, ErrorCode};
use shared::status::{OrderStatus, PaymentStatus, ProviderKind};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::error::ServiceResult;
use crate::payment::{self, PaymentError};
use crate::services::billing;
use crate::services::{analytics, analytics::AnalyticsEventType};
use crate::state::AppState;

/// What intent creation hands back to the client
#[derive(Debug)]
pub struct PaymentCreated {
    pub intent_id: String,
    pub status: PaymentStatus,
    pub provider: ProviderKind,
    pub amount_minor_units: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    /// Publishable key the client needs to confirm the intent; only set when
    /// the provider handed back a client secret
    pub publishable_key: Option<String>,
}

/// Outcome of one webhook delivery
#[derive(Debug)]
pub struct WebhookOutcome {
    pub intent_id: String,
    pub intent_status: PaymentStatus,
    /// False when the delivery was a repeat or an illegal backward move
    pub transitioned: bool,
}

fn payment_error_to_app(e: PaymentError) -> AppError {
    match e {
        PaymentError::Provider(msg) => {
            tracing::error!(error = %msg, "Payment provider call failed");
            AppError::new(ErrorCode::PaymentProviderError)
        }
        PaymentError::Signature => AppError::new(ErrorCode::WebhookSignatureInvalid),
        PaymentError::Payload(msg) => {
            AppError::with_message(ErrorCode::WebhookPayloadInvalid, msg)
        }
    }
}

/// Create a payment intent for an order the caller owns
pub async fn create_payment(
    state: &AppState,
    user: &UserIdentity,
    order_id: i64,
    provider: Option<String>,
) -> ServiceResult<PaymentCreated> {
    let order = db::orders::find_for_user(&state.pool, order_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    match OrderStatus::from_db(&order.status) {
        Some(OrderStatus::Created) | Some(OrderStatus::Failed) => {}
        Some(OrderStatus::Paid) => {
            return Err(
                AppError::with_message(ErrorCode::InvalidRequest, "Order is already paid").into(),
            );
        }
        Some(OrderStatus::Refunded) => {
            return Err(AppError::new(ErrorCode::OrderRefunded).into());
        }
        None => return Err(AppError::new(ErrorCode::InternalError).into()),
    }

    let provider_name = provider.unwrap_or_else(|| state.config.payment_provider.clone());
    let kind = ProviderKind::from_db(&provider_name).ok_or_else(|| {
        AppError::new(ErrorCode::PaymentProviderUnsupported)
            .with_detail("provider", provider_name.clone())
    })?;

    let gateway = payment::gateway_for(kind, state);
    let metadata = json!({
        "order_id": order.id.to_string(),
        "user_id": user.user_id.to_string(),
    });
    let intent = gateway
        .create_intent(
            order.amount_minor_units,
            &order.currency,
            &metadata,
            order.idempotency_key.as_deref(),
        )
        .await
        .map_err(payment_error_to_app)?;

    let inserted = db::payments::insert(
        &state.pool,
        snowflake_id(),
        order.id,
        kind.as_db(),
        intent.status.as_db(),
        &intent.intent_id,
        &intent.raw,
        now_millis(),
    )
    .await?;
    if !inserted {
        return Err(AppError::new(ErrorCode::DuplicateIntent).into());
    }

    // Some providers settle at create time; derive the order status the
    // same way the webhook path would.
    if intent.status == PaymentStatus::Succeeded {
        let mut conn = state.pool.acquire().await?;
        db::orders::update_status(&mut conn, order.id, OrderStatus::Paid.as_db()).await?;
        on_payment_succeeded(state, &order, kind).await;
    }

    let publishable_key = intent
        .client_secret
        .as_ref()
        .map(|_| state.config.stripe_publishable_key.clone())
        .filter(|key| !key.is_empty());

    Ok(PaymentCreated {
        intent_id: intent.intent_id,
        status: intent.status,
        provider: kind,
        amount_minor_units: order.amount_minor_units,
        currency: order.currency,
        client_secret: intent.client_secret,
        publishable_key,
    })
}

/// Reconcile one webhook delivery into the payment and order ledger.
///
/// Safe under at-least-once delivery: signature verification happens before
/// any state is read, the payment transition predicate rejects repeats and
/// backward moves, and the invoice/analytics side effects fire only on the
/// first transition into `succeeded`.
pub async fn reconcile_webhook(
    state: &AppState,
    provider: &str,
    raw_body: &[u8],
    headers: &HeaderMap,
) -> ServiceResult<WebhookOutcome> {
    let kind = ProviderKind::from_db(provider).ok_or_else(|| {
        AppError::new(ErrorCode::PaymentProviderUnsupported)
            .with_detail("provider", provider.to_string())
    })?;
    let gateway = payment::gateway_for(kind, state);

    let payload = gateway
        .parse_webhook_payload(raw_body, headers)
        .map_err(payment_error_to_app)?;
    let intent = gateway
        .process_webhook(&payload)
        .map_err(payment_error_to_app)?;

    // The transition check must run on a locked row: a concurrent delivery
    // for the same intent waits here and then sees this delivery's commit.
    let mut tx = state.pool.begin().await?;

    let payment_row = db::payments::find_by_intent_for_update(&mut tx, &intent.intent_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    let previous = PaymentStatus::from_db(&payment_row.status)
        .ok_or_else(|| AppError::new(ErrorCode::InternalError))?;

    if !previous.can_transition_to(intent.status) {
        if previous != intent.status {
            tracing::warn!(
                intent_id = %intent.intent_id,
                from = previous.as_db(),
                to = intent.status.as_db(),
                "Ignoring non-forward payment transition"
            );
        }
        return Ok(WebhookOutcome {
            intent_id: intent.intent_id,
            intent_status: previous,
            transitioned: false,
        });
    }

    let order = db::orders::find_by_id_for_update(&mut tx, payment_row.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let order_status = OrderStatus::from_db(&order.status)
        .ok_or_else(|| AppError::new(ErrorCode::InternalError))?;

    db::payments::update_from_webhook(&mut tx, payment_row.id, intent.status.as_db(), &intent.raw)
        .await?;

    let next_order_status = match intent.status {
        PaymentStatus::Succeeded => Some(OrderStatus::Paid),
        PaymentStatus::Failed => Some(OrderStatus::Failed),
        PaymentStatus::RequiresAction => None,
    };
    if let Some(next) = next_order_status {
        if order_status.can_transition_to(next) {
            db::orders::update_status(&mut tx, order.id, next.as_db()).await?;
        } else if order_status != next {
            tracing::warn!(
                order_id = order.id,
                from = order_status.as_db(),
                to = next.as_db(),
                "Ignoring non-forward order transition"
            );
        }
    }

    tx.commit().await?;

    // First transition into succeeded: issue the invoice and count the
    // revenue. Both are best-effort and must not fail the reconciliation.
    if intent.status == PaymentStatus::Succeeded {
        on_payment_succeeded(state, &order, kind).await;
    }

    Ok(WebhookOutcome {
        intent_id: intent.intent_id,
        intent_status: intent.status,
        transitioned: true,
    })
}

/// Invoice + revenue event for an order that just reached paid. Best-effort:
/// failures are logged, never propagated.
async fn on_payment_succeeded(
    state: &AppState,
    order: &db::orders::OrderRow,
    provider: ProviderKind,
) {
    if let Err(e) =
        billing::generate_invoice_for_order(&state.pool, &state.config.invoice_prefix, order).await
    {
        let app: AppError = e.into();
        tracing::error!(order_id = order.id, error = %app, "Invoice generation failed");
    }

    analytics::record_event(
        &state.pool,
        Some(order.user_id),
        AnalyticsEventType::PurchaseCompleted,
        json!({
            "order_id": order.id.to_string(),
            "amount_minor_units": order.amount_minor_units,
            "currency": order.currency,
            "provider": provider.as_db(),
        }),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::orders;
    use crate::test_support;
    use sqlx::PgPool;

    async fn order_with_intent(state: &AppState) -> (i64, PaymentCreated) {
        let user = test_support::user();
        let (order, _) = orders::create_order(state, &user, test_support::PLAN_ID, None, None)
            .await
            .unwrap();
        let created = create_payment(state, &user, order.id, None).await.unwrap();
        (order.id, created)
    }

    fn succeeded_body(intent_id: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({"intent_id": intent_id, "status": "succeeded"}))
            .expect("serializable")
    }

    #[sqlx::test]
    async fn test_create_payment_returns_client_keys(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());

        let (_, created) = order_with_intent(&state).await;

        assert_eq!(created.status, PaymentStatus::RequiresAction);
        assert_eq!(created.amount_minor_units, 1250);
        assert!(created.client_secret.is_some());
        // The publishable key travels with the client secret so the client
        // can confirm the intent.
        assert_eq!(created.publishable_key.as_deref(), Some("pk_test_fixture"));
    }

    #[sqlx::test]
    async fn test_webhook_redelivery_counts_revenue_once(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let (order_id, created) = order_with_intent(&state).await;

        let body = succeeded_body(&created.intent_id);
        let headers = HeaderMap::new();

        let first = reconcile_webhook(&state, "MOCK", &body, &headers)
            .await
            .unwrap();
        assert!(first.transitioned);
        assert_eq!(first.intent_status, PaymentStatus::Succeeded);

        // Redelivery of the same event is a no-op, not a second settlement.
        let second = reconcile_webhook(&state, "MOCK", &body, &headers)
            .await
            .unwrap();
        assert!(!second.transitioned);
        assert_eq!(second.intent_status, PaymentStatus::Succeeded);

        let order = db::orders::find_by_id(&pool, order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid.as_db());

        let invoices = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM invoices WHERE order_id = $1",
            order_id,
        )
        .await;
        assert_eq!(invoices, 1);

        let (revenue_events,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM analytics_events WHERE event_type = 'purchase_completed'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(revenue_events, 1);
    }

    #[sqlx::test]
    async fn test_webhook_ignores_backward_transition(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let (order_id, created) = order_with_intent(&state).await;
        let headers = HeaderMap::new();

        reconcile_webhook(&state, "MOCK", &succeeded_body(&created.intent_id), &headers)
            .await
            .unwrap();

        let failed_body =
            serde_json::to_vec(&json!({"intent_id": created.intent_id, "status": "failed"}))
                .expect("serializable");
        let outcome = reconcile_webhook(&state, "MOCK", &failed_body, &headers)
            .await
            .unwrap();
        assert!(!outcome.transitioned);
        assert_eq!(outcome.intent_status, PaymentStatus::Succeeded);

        let order = db::orders::find_by_id(&pool, order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid.as_db());
    }

    #[sqlx::test]
    async fn test_webhook_unknown_intent_rejected(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());

        let err = reconcile_webhook(
            &state,
            "MOCK",
            &succeeded_body("mock_pi_unknown"),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::App(app) => assert_eq!(app.code, ErrorCode::PaymentNotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
