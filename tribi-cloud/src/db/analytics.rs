//! Analytics event queries

use serde_json::Value;
use sqlx::PgPool;

use shared::util::{now_millis, snowflake_id};

/// Append one analytics event
pub async fn insert_event(
    pool: &PgPool,
    user_id: Option<i64>,
    event_type: &str,
    payload: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO analytics_events (id, user_id, event_type, payload, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(snowflake_id())
    .bind(user_id)
    .bind(event_type)
    .bind(payload)
    .bind(now_millis())
    .execute(pool)
    .await?;

    Ok(())
}
