//! Plan catalog queries
//!
//! The catalog itself is managed elsewhere; order creation only needs a
//! read-only view of a plan joined with its country and carrier names to
//! build the immutable plan snapshot.

use rust_decimal::Decimal;
use sqlx::PgPool;

/// A plan joined with its country and carrier for snapshotting
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanDetails {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
    pub carrier_id: i64,
    pub country_name: String,
    pub carrier_name: String,
    /// Data allowance in megabytes
    pub data_amount_mb: i64,
    pub duration_days: i32,
    /// Major-unit price (e.g. 12.50)
    pub price: Decimal,
}

/// Find an active plan by ID with country/carrier names resolved
pub async fn find_active_by_id(pool: &PgPool, id: i64) -> Result<Option<PlanDetails>, sqlx::Error> {
    sqlx::query_as::<_, PlanDetails>(
        r#"
        SELECT p.id, p.name, p.country_id, p.carrier_id,
               co.name AS country_name, ca.name AS carrier_name,
               p.data_amount_mb, p.duration_days, p.price
        FROM plans p
        JOIN countries co ON co.id = p.country_id
        JOIN carriers ca ON ca.id = p.carrier_id
        WHERE p.id = $1 AND p.is_active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
