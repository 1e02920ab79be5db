//! eSIM inventory pool queries
//!
//! `reserve` implements claim-one-slot semantics: `FOR UPDATE SKIP LOCKED`
//! guarantees two concurrent callers never lock the same row, and a caller
//! who finds nothing returns immediately instead of blocking. It must run
//! inside the caller's transaction so the reservation commits (or rolls
//! back) together with the rest of the activation work.

use serde_json::Value;
use sqlx::PgConnection;

use shared::util::now_millis;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EsimInventoryRow {
    pub id: i64,
    pub plan_id: Option<i64>,
    pub country_id: Option<i64>,
    pub carrier_id: Option<i64>,
    pub activation_code: String,
    pub iccid: Option<String>,
    pub qr_payload: Option<String>,
    pub instructions: Option<String>,
    pub status: String,
    pub provider_reference: Option<String>,
    pub provider_payload: Option<Value>,
    pub reserved_at: Option<i64>,
    pub assigned_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Claim the oldest available slot matching the most specific filter.
///
/// Filter tiers: plan beats country beats carrier; only one tier applies per
/// call. Returns None when the pool has no match (the caller falls back to
/// on-demand provisioning).
pub async fn reserve(
    conn: &mut PgConnection,
    plan_id: Option<i64>,
    country_id: Option<i64>,
    carrier_id: Option<i64>,
) -> Result<Option<EsimInventoryRow>, sqlx::Error> {
    let (filter, value) = if let Some(plan_id) = plan_id {
        ("plan_id", plan_id)
    } else if let Some(country_id) = country_id {
        ("country_id", country_id)
    } else if let Some(carrier_id) = carrier_id {
        ("carrier_id", carrier_id)
    } else {
        return Ok(None);
    };

    let sql = format!(
        r#"
        UPDATE esim_inventory
        SET status = 'reserved', reserved_at = $2, updated_at = $2
        WHERE id = (
            SELECT id FROM esim_inventory
            WHERE status = 'available' AND {filter} = $1
            ORDER BY id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING *
        "#
    );

    sqlx::query_as::<_, EsimInventoryRow>(&sql)
        .bind(value)
        .bind(now_millis())
        .fetch_optional(conn)
        .await
}

/// Flip a reserved slot to assigned inside the caller's transaction
pub async fn mark_assigned(conn: &mut PgConnection, id: i64) -> Result<(), sqlx::Error> {
    let now = now_millis();
    sqlx::query(
        "UPDATE esim_inventory SET status = 'assigned', assigned_at = $1, updated_at = $1 WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Persist an already-assigned slot for an eSIM provisioned on demand.
///
/// Every activation ends with exactly one inventory record, whether the
/// profile was served from stock or from a partner call.
#[allow(clippy::too_many_arguments)]
pub async fn insert_assigned(
    conn: &mut PgConnection,
    id: i64,
    plan_id: Option<i64>,
    country_id: Option<i64>,
    carrier_id: Option<i64>,
    activation_code: &str,
    iccid: Option<&str>,
    qr_payload: Option<&str>,
    instructions: Option<&str>,
    provider_reference: Option<&str>,
    provider_payload: &Value,
) -> Result<(), sqlx::Error> {
    let now = now_millis();
    sqlx::query(
        r#"
        INSERT INTO esim_inventory (id, plan_id, country_id, carrier_id, activation_code,
                                    iccid, qr_payload, instructions, status,
                                    provider_reference, provider_payload,
                                    assigned_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'assigned', $9, $10, $11, $11, $11)
        "#,
    )
    .bind(id)
    .bind(plan_id)
    .bind(country_id)
    .bind(carrier_id)
    .bind(activation_code)
    .bind(iccid)
    .bind(qr_payload)
    .bind(instructions)
    .bind(provider_reference)
    .bind(provider_payload)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}
