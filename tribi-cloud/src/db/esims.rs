//! eSIM profile queries
//!
//! One profile per order (unique on order_id), created in the same
//! transaction as the order and finalized once by the activation workflow.

use serde_json::Value;
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EsimProfileRow {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub country_id: Option<i64>,
    pub carrier_id: Option<i64>,
    /// Link to the inventory row that served this profile
    pub inventory_item_id: Option<i64>,
    pub activation_code: Option<String>,
    pub iccid: Option<String>,
    pub qr_payload: Option<String>,
    pub instructions: Option<String>,
    pub status: String,
    pub provisioned_at: Option<i64>,
    pub provider_reference: Option<String>,
    pub provider_payload: Option<Value>,
    pub created_at: i64,
}

/// Insert a pre-registered profile (no activation material yet) inside the
/// caller's transaction
#[allow(clippy::too_many_arguments)]
pub async fn insert_pending(
    conn: &mut PgConnection,
    id: i64,
    order_id: i64,
    user_id: i64,
    plan_id: i64,
    country_id: Option<i64>,
    carrier_id: Option<i64>,
    status: &str,
    created_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO esim_profiles (id, order_id, user_id, plan_id, country_id, carrier_id,
                                   status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(user_id)
    .bind(plan_id)
    .bind(country_id)
    .bind(carrier_id)
    .bind(status)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Find the profile attached to an order
pub async fn find_by_order(
    pool: &PgPool,
    order_id: i64,
) -> Result<Option<EsimProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, EsimProfileRow>("SELECT * FROM esim_profiles WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

/// Find the profile attached to an order and lock it for the caller's
/// transaction.
///
/// Concurrent activations of the same order serialize on this lock, so the
/// already-provisioned check always sees the winner's committed state.
pub async fn find_by_order_for_update(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Option<EsimProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, EsimProfileRow>("SELECT * FROM esim_profiles WHERE order_id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

/// Find a profile by ID, scoped to its owner
pub async fn find_for_user(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<EsimProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, EsimProfileRow>(
        "SELECT * FROM esim_profiles WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// List a user's profiles, newest first
pub async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<EsimProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, EsimProfileRow>(
        "SELECT * FROM esim_profiles WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Apply activation material to a profile inside the caller's transaction
#[allow(clippy::too_many_arguments)]
pub async fn apply_provisioning(
    conn: &mut PgConnection,
    id: i64,
    inventory_item_id: i64,
    activation_code: &str,
    iccid: Option<&str>,
    qr_payload: Option<&str>,
    instructions: Option<&str>,
    status: &str,
    provisioned_at: i64,
    provider_reference: Option<&str>,
    provider_payload: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE esim_profiles
        SET inventory_item_id = $1, activation_code = $2, iccid = $3, qr_payload = $4,
            instructions = $5, status = $6, provisioned_at = $7, provider_reference = $8,
            provider_payload = $9
        WHERE id = $10
        "#,
    )
    .bind(inventory_item_id)
    .bind(activation_code)
    .bind(iccid)
    .bind(qr_payload)
    .bind(instructions)
    .bind(status)
    .bind(provisioned_at)
    .bind(provider_reference)
    .bind(provider_payload)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}
