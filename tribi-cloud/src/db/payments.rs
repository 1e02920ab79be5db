//! Payment queries
//!
//! `intent_id` carries a unique constraint: webhook reconciliation and
//! intent creation both key on it.

use serde_json::Value;
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub order_id: i64,
    pub provider: String,
    pub status: String,
    /// Provider-assigned intent ID, globally unique
    pub intent_id: String,
    /// Raw provider payload (JSONB)
    pub payload: Value,
    pub created_at: i64,
}

/// Record a new payment attempt. Returns false if the intent ID is already
/// recorded (unique constraint hit, no row inserted).
pub async fn insert(
    pool: &PgPool,
    id: i64,
    order_id: i64,
    provider: &str,
    status: &str,
    intent_id: &str,
    payload: &Value,
    created_at: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO payments (id, order_id, provider, status, intent_id, payload, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (intent_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(provider)
    .bind(status)
    .bind(intent_id)
    .bind(payload)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Find a payment by intent ID and lock it for the caller's transaction.
///
/// Concurrent webhook deliveries for the same intent serialize on this lock,
/// so the status transition check always sees the latest committed state.
pub async fn find_by_intent_for_update(
    conn: &mut PgConnection,
    intent_id: &str,
) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE intent_id = $1 FOR UPDATE")
        .bind(intent_id)
        .fetch_optional(conn)
        .await
}

/// Update a payment's status and raw payload inside the caller's transaction
pub async fn update_from_webhook(
    conn: &mut PgConnection,
    id: i64,
    status: &str,
    payload: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET status = $1, payload = $2 WHERE id = $3")
        .bind(status)
        .bind(payload)
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}
