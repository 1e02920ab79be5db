//! Invoice queries
//!
//! One invoice per paid order, keyed by order_id.

use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub invoice_number: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub status: String,
    pub issued_at: i64,
}

/// Find the invoice for an order, if one was already issued
pub async fn find_by_order(
    pool: &PgPool,
    order_id: i64,
) -> Result<Option<InvoiceRow>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceRow>("SELECT * FROM invoices WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

/// Issue an invoice. Returns false if the order already has one (unique
/// constraint hit, no row inserted).
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    pool: &PgPool,
    id: i64,
    order_id: i64,
    user_id: i64,
    invoice_number: &str,
    amount_minor_units: i64,
    currency: &str,
    status: &str,
    issued_at: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO invoices (id, order_id, user_id, invoice_number, amount_minor_units,
                              currency, status, issued_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (order_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(user_id)
    .bind(invoice_number)
    .bind(amount_minor_units)
    .bind(currency)
    .bind(status)
    .bind(issued_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
