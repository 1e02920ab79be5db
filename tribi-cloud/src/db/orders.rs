//! Order queries

use serde_json::Value;
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    /// Immutable pricing snapshot captured at creation (JSONB)
    pub plan_snapshot: Value,
    pub status: String,
    pub currency: String,
    pub amount_minor_units: i64,
    pub idempotency_key: Option<String>,
    pub created_at: i64,
}

/// Insert a new order inside the caller's transaction
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    conn: &mut PgConnection,
    id: i64,
    user_id: i64,
    plan_id: i64,
    plan_snapshot: &Value,
    status: &str,
    currency: &str,
    amount_minor_units: i64,
    idempotency_key: Option<&str>,
    created_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, plan_id, plan_snapshot, status, currency,
                            amount_minor_units, idempotency_key, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(plan_id)
    .bind(plan_snapshot)
    .bind(status)
    .bind(currency)
    .bind(amount_minor_units)
    .bind(idempotency_key)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Find an order by (user, idempotency key)
pub async fn find_by_idempotency_key(
    pool: &PgPool,
    user_id: i64,
    key: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = $1 AND idempotency_key = $2",
    )
    .bind(user_id)
    .bind(key)
    .fetch_optional(pool)
    .await
}

/// Find an order by ID
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find an order by ID and lock it for the caller's transaction
pub async fn find_by_id_for_update(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Find an order by ID, scoped to its owner
pub async fn find_for_user(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// List a user's orders, newest first
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Update an order's status inside the caller's transaction
pub async fn update_status(
    conn: &mut PgConnection,
    id: i64,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}
