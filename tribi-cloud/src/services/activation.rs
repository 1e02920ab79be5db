//! Activation workflow
//!
//! Drives an eSIM profile from pending to active: try the inventory pool
//! first, fall back to the provisioning provider, and finalize the profile
//! in the same transaction as the reservation so a failure anywhere leaves
//! no residue.

use serde_json::{Value, json};

use shared::error::{AppError, ErrorCode};
use shared::status::{EsimStatus, OrderStatus};
use shared::util::{now_millis, snowflake_id};

use crate::auth::UserIdentity;
use crate::db;
use crate::db::esims::EsimProfileRow;
use crate::error::{ServiceError, ServiceResult};
use crate::provisioning::{self, DEFAULT_INSTRUCTIONS, ProvisionRequest, ProvisioningResult};
use crate::services::{analytics, analytics::AnalyticsEventType};
use crate::state::AppState;

/// Activate the eSIM for a paid order.
///
/// Idempotent: a profile that already carries activation material is
/// returned unchanged. A provisioning failure rolls everything back, so the
/// profile stays pending and the call is safely retryable.
pub async fn activate(
    state: &AppState,
    user: &UserIdentity,
    order_id: i64,
) -> ServiceResult<EsimProfileRow> {
    let order = db::orders::find_for_user(&state.pool, order_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    match OrderStatus::from_db(&order.status) {
        Some(OrderStatus::Paid) => {}
        Some(OrderStatus::Refunded) => return Err(AppError::new(ErrorCode::OrderRefunded).into()),
        Some(_) => return Err(AppError::new(ErrorCode::OrderNotPaid).into()),
        None => return Err(AppError::new(ErrorCode::InternalError).into()),
    }

    // Lock the profile before checking it: a concurrent activation of the
    // same order waits here, then sees the winner's committed material and
    // takes the replay path instead of provisioning a second slot.
    let mut tx = state.pool.begin().await?;

    let profile = db::esims::find_by_order_for_update(&mut tx, order.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::EsimNotFound))?;
    let profile_status = EsimStatus::from_db(&profile.status)
        .ok_or_else(|| AppError::new(ErrorCode::InternalError))?;

    if profile.provisioned_at.is_some() || profile_status.already_provisioned() {
        return Ok(profile);
    }
    if !profile_status.ready_for_activation() {
        return Err(AppError::new(ErrorCode::EsimNotReady).into());
    }

    let reserved = db::inventory::reserve(
        &mut tx,
        Some(order.plan_id),
        profile.country_id,
        profile.carrier_id,
    )
    .await?;

    let (inventory_id, result) = match reserved {
        Some(item) => {
            db::inventory::mark_assigned(&mut tx, item.id).await?;
            let metadata = item
                .provider_payload
                .clone()
                .unwrap_or_else(|| json!({"source": "inventory"}));
            (
                item.id,
                ProvisioningResult {
                    activation_code: item.activation_code,
                    iccid: item.iccid,
                    qr_payload: item.qr_payload,
                    instructions: item
                        .instructions
                        .or_else(|| Some(DEFAULT_INSTRUCTIONS.to_string())),
                    provider_reference: item.provider_reference,
                    metadata,
                },
            )
        }
        None => {
            let provider = provisioning::provider_for(state).map_err(ServiceError::App)?;
            let request = ProvisionRequest {
                order_id: order.id,
                customer_email: user.email.clone(),
                plan_snapshot: order.plan_snapshot.clone(),
            };
            // Transaction rolls back on error: profile stays pending.
            let result = provider.provision(&request).await.map_err(|e| {
                tracing::error!(order_id = order.id, error = %e, "eSIM provisioning failed");
                AppError::new(ErrorCode::ProvisioningFailed)
            })?;

            let inventory_id = snowflake_id();
            db::inventory::insert_assigned(
                &mut tx,
                inventory_id,
                Some(order.plan_id),
                profile.country_id,
                profile.carrier_id,
                &result.activation_code,
                result.iccid.as_deref(),
                result.qr_payload.as_deref(),
                result.instructions.as_deref(),
                result.provider_reference.as_deref(),
                &result.metadata,
            )
            .await?;
            (inventory_id, result)
        }
    };

    let provisioned_at = now_millis();
    db::esims::apply_provisioning(
        &mut tx,
        profile.id,
        inventory_id,
        &result.activation_code,
        result.iccid.as_deref(),
        result.qr_payload.as_deref(),
        result.instructions.as_deref(),
        EsimStatus::Active.as_db(),
        provisioned_at,
        result.provider_reference.as_deref(),
        &result.metadata,
    )
    .await?;

    tx.commit().await?;

    analytics::record_event(
        &state.pool,
        Some(order.user_id),
        AnalyticsEventType::EsimActivated,
        json!({
            "order_id": order.id.to_string(),
            "esim_profile_id": profile.id.to_string(),
            "plan_name": order.plan_snapshot.get("name").cloned().unwrap_or(Value::Null),
        }),
    )
    .await;

    db::esims::find_by_order(&state.pool, order.id)
        .await?
        .ok_or_else(|| ServiceError::from(sqlx::Error::RowNotFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::orders;
    use crate::test_support;
    use sqlx::PgPool;

    async fn paid_order(state: &AppState, pool: &PgPool) -> i64 {
        let user = test_support::user();
        let (order, _) = orders::create_order(state, &user, test_support::PLAN_ID, None, None)
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        db::orders::update_status(&mut conn, order.id, OrderStatus::Paid.as_db())
            .await
            .unwrap();
        order.id
    }

    #[sqlx::test]
    async fn test_activate_idempotent_replay(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let user = test_support::user();
        let order_id = paid_order(&state, &pool).await;

        let first = activate(&state, &user, order_id).await.unwrap();
        assert_eq!(first.status, EsimStatus::Active.as_db());
        assert!(first.provisioned_at.is_some());
        assert!(first.activation_code.is_some());

        // A repeated activation returns the same material and provisions
        // nothing new.
        let second = activate(&state, &user, order_id).await.unwrap();
        assert_eq!(second.activation_code, first.activation_code);
        assert_eq!(second.iccid, first.iccid);
        assert_eq!(second.inventory_item_id, first.inventory_item_id);

        let slots = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM esim_inventory WHERE plan_id = $1",
            test_support::PLAN_ID,
        )
        .await;
        assert_eq!(slots, 1);
    }

    #[sqlx::test]
    async fn test_activate_serves_pooled_slot_first(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        sqlx::query(
            r#"
            INSERT INTO esim_inventory (id, plan_id, activation_code, iccid, status,
                                        created_at, updated_at)
            VALUES (50, $1, 'LOCAL-POOLED01', '8901000000000000050', 'available', 0, 0)
            "#,
        )
        .bind(test_support::PLAN_ID)
        .execute(&pool)
        .await
        .unwrap();

        let state = test_support::state(pool.clone());
        let user = test_support::user();
        let order_id = paid_order(&state, &pool).await;

        let profile = activate(&state, &user, order_id).await.unwrap();
        assert_eq!(profile.activation_code.as_deref(), Some("LOCAL-POOLED01"));
        assert_eq!(profile.inventory_item_id, Some(50));

        let (slot_status,): (String,) =
            sqlx::query_as("SELECT status FROM esim_inventory WHERE id = 50")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(slot_status, "assigned");
    }

    #[sqlx::test]
    async fn test_activate_requires_paid_order(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        let state = test_support::state(pool.clone());
        let user = test_support::user();
        let (order, _) = orders::create_order(&state, &user, test_support::PLAN_ID, None, None)
            .await
            .unwrap();

        let err = activate(&state, &user, order.id).await.unwrap_err();
        match err {
            ServiceError::App(app) => assert_eq!(app.code, ErrorCode::OrderNotPaid),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[sqlx::test]
    async fn test_provisioning_failure_leaves_profile_pending(pool: PgPool) {
        test_support::seed_catalog(&pool).await;
        // Live partner mode against an unreachable endpoint: the provider
        // call fails after the pool comes up empty.
        let config = Config {
            esim_provider: "CONNECTED_YOU".into(),
            connected_you_base_url: "http://127.0.0.1:9".into(),
            connected_you_api_key: "key".into(),
            connected_you_dry_run: false,
            ..test_support::config()
        };
        let state = test_support::state_with(pool.clone(), config);
        let user = test_support::user();
        let order_id = paid_order(&state, &pool).await;

        let err = activate(&state, &user, order_id).await.unwrap_err();
        match err {
            ServiceError::App(app) => assert_eq!(app.code, ErrorCode::ProvisioningFailed),
            other => panic!("unexpected error: {other:?}"),
        }

        let profile = db::esims::find_by_order(&pool, order_id).await.unwrap().unwrap();
        assert_eq!(profile.status, EsimStatus::PendingActivation.as_db());
        assert!(profile.provisioned_at.is_none());
        assert!(profile.activation_code.is_none());

        let slots = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM esim_inventory WHERE plan_id = $1",
            test_support::PLAN_ID,
        )
        .await;
        assert_eq!(slots, 0);
    }
}
