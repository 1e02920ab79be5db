//! Order creation and payment-driven status reconciliation

use serde_json::json;

use shared::error::{AppError, ErrorCode};
use shared::status::{EsimStatus, OrderStatus};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::db::esims::EsimProfileRow;
use crate::db::orders::OrderRow;
use crate::error::{ServiceError, ServiceResult};
use crate::services::{analytics, analytics::AnalyticsEventType, pricing};
use crate::state::AppState;

/// Create an order with its pre-registered eSIM profile.
///
/// Idempotent per (user, key): a repeated key returns the original order
/// with no new rows and no side effects. The order and profile insert in
/// one transaction, so neither ever exists without the other.
pub async fn create_order(
    state: &AppState,
    user: &UserIdentity,
    plan_id: i64,
    currency: Option<String>,
    idempotency_key: Option<String>,
) -> ServiceResult<(OrderRow, EsimProfileRow)> {
    if let Some(key) = idempotency_key.as_deref() {
        if let Some(existing) =
            db::orders::find_by_idempotency_key(&state.pool, user.user_id, key).await?
        {
            let profile = load_profile(state, existing.id).await?;
            return Ok((existing, profile));
        }
    }

    let plan = db::plans::find_active_by_id(&state.pool, plan_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound))?;

    let amount_minor_units = pricing::to_minor_units(plan.price).ok_or_else(|| {
        AppError::with_message(ErrorCode::InternalError, "Plan price out of range")
    })?;
    let currency = currency.unwrap_or_else(|| state.config.default_currency.clone());

    let plan_snapshot = json!({
        "name": plan.name,
        "country": plan.country_name,
        "carrier": plan.carrier_name,
        "data_amount_mb": plan.data_amount_mb,
        "duration_days": plan.duration_days,
        "price_minor_units": amount_minor_units,
        "currency": currency,
    });

    let order_id = snowflake_id();
    let profile_id = snowflake_id();
    let now = now_millis();

    let mut tx = state.pool.begin().await?;

    let insert_result = db::orders::insert(
        &mut tx,
        order_id,
        user.user_id,
        plan.id,
        &plan_snapshot,
        OrderStatus::Created.as_db(),
        &currency,
        amount_minor_units,
        idempotency_key.as_deref(),
        now,
    )
    .await;

    // A racing request with the same key may have won the (user, key)
    // uniqueness; hand back its order instead of failing.
    if let Err(e) = insert_result {
        let unique_hit = e
            .as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false);
        tx.rollback().await?;
        if unique_hit {
            if let Some(key) = idempotency_key.as_deref() {
                if let Some(existing) =
                    db::orders::find_by_idempotency_key(&state.pool, user.user_id, key).await?
                {
                    let profile = load_profile(state, existing.id).await?;
                    return Ok((existing, profile));
                }
            }
        }
        return Err(ServiceError::from(e));
    }

    db::esims::insert_pending(
        &mut tx,
        profile_id,
        order_id,
        user.user_id,
        plan.id,
        Some(plan.country_id),
        Some(plan.carrier_id),
        EsimStatus::PendingActivation.as_db(),
        now,
    )
    .await?;

    tx.commit().await?;

    analytics::record_event(
        &state.pool,
        Some(user.user_id),
        AnalyticsEventType::CheckoutStarted,
        json!({
            "order_id": order_id.to_string(),
            "plan_id": plan.id.to_string(),
            "amount_minor_units": amount_minor_units,
            "currency": currency,
        }),
    )
    .await;

    let order = db::orders::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let profile = load_profile(state, order_id).await?;

    Ok((order, profile))
}

/// List a user's orders with their eSIM profiles attached
pub async fn list_orders(
    state: &AppState,
    user: &UserIdentity,
) -> ServiceResult<Vec<(OrderRow, Option<EsimProfileRow>)>> {
    let orders = db::orders::list_for_user(&state.pool, user.user_id).await?;
    let profiles = db::esims::list_for_user(&state.pool, user.user_id).await?;

    let result = orders
        .into_iter()
        .map(|order| {
            let profile = profiles.iter().find(|p| p.order_id == order.id).cloned();
            (order, profile)
        })
        .collect();

    Ok(result)
}

async fn load_profile(state: &AppState, order_id: i64) -> ServiceResult<EsimProfileRow> {
    db::esims::find_by_order(&state.pool, order_id)
        .await?
        .ok_or_else(|| ServiceError::from(sqlx::Error::RowNotFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_order_idempotent_per_key(pool: PgPool) {
        let plan_id = test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let user = test_support::user();

        let (first, first_profile) =
            create_order(&state, &user, plan_id, None, Some("key-1".into()))
                .await
                .unwrap();
        let (second, second_profile) =
            create_order(&state, &user, plan_id, None, Some("key-1".into()))
                .await
                .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first_profile.id, second_profile.id);
        assert_eq!(first.amount_minor_units, 1250);
        assert_eq!(first.status, OrderStatus::Created.as_db());

        let orders = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM orders WHERE user_id = $1",
            user.user_id,
        )
        .await;
        let profiles = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM esim_profiles WHERE user_id = $1",
            user.user_id,
        )
        .await;
        assert_eq!(orders, 1);
        assert_eq!(profiles, 1);
    }

    #[sqlx::test]
    async fn test_create_order_distinct_keys_make_distinct_orders(pool: PgPool) {
        let plan_id = test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let user = test_support::user();

        let (first, _) = create_order(&state, &user, plan_id, None, Some("key-a".into()))
            .await
            .unwrap();
        let (second, _) = create_order(&state, &user, plan_id, None, Some("key-b".into()))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
    }

    #[sqlx::test]
    async fn test_create_order_currency_defaults_from_config(pool: PgPool) {
        let plan_id = test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let user = test_support::user();

        let (defaulted, _) = create_order(&state, &user, plan_id, None, None).await.unwrap();
        assert_eq!(defaulted.currency, "USD");

        let (explicit, _) =
            create_order(&state, &user, plan_id, Some("EUR".into()), None)
                .await
                .unwrap();
        assert_eq!(explicit.currency, "EUR");
        assert_eq!(explicit.plan_snapshot.get("currency").and_then(|v| v.as_str()), Some("EUR"));
    }

    #[sqlx::test]
    async fn test_create_order_unknown_plan_rejected(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let user = test_support::user();

        let err = create_order(&state, &user, 999_999, None, None)
            .await
            .unwrap_err();
        match err {
            ServiceError::App(app) => assert_eq!(app.code, ErrorCode::PlanNotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
