//! Invoice generation
//!
//! One invoice per paid order. The lookup-before-insert plus the unique
//! constraint on order_id make this safe under webhook redelivery.

use sqlx::PgPool;

use shared::status::InvoiceStatus;
use shared::util::{now_millis, snowflake_id};

use crate::db;
use crate::db::invoices::InvoiceRow;
use crate::db::orders::OrderRow;
use crate::error::ServiceResult;

/// Build the customer-facing invoice number
pub fn invoice_number(prefix: &str, order_id: i64) -> String {
    format!("{prefix}-{order_id:06}")
}

/// Issue the invoice for a paid order, returning the existing one if it was
/// already generated
pub async fn generate_invoice_for_order(
    pool: &PgPool,
    prefix: &str,
    order: &OrderRow,
) -> ServiceResult<InvoiceRow> {
    if let Some(existing) = db::invoices::find_by_order(pool, order.id).await? {
        return Ok(existing);
    }

    let id = snowflake_id();
    let number = invoice_number(prefix, order.id);
    let issued = db::invoices::insert(
        pool,
        id,
        order.id,
        order.user_id,
        &number,
        order.amount_minor_units,
        &order.currency,
        InvoiceStatus::Issued.as_db(),
        now_millis(),
    )
    .await?;

    if issued {
        tracing::info!(order_id = order.id, invoice_number = %number, "Invoice issued");
    }

    // A racing webhook delivery may have inserted first; either way the
    // invoice now exists.
    match db::invoices::find_by_order(pool, order.id).await? {
        Some(invoice) => Ok(invoice),
        None => Err(sqlx::Error::RowNotFound.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(invoice_number("TRB", 42), "TRB-000042");
        assert_eq!(invoice_number("TRB", 7241530882123456), "TRB-7241530882123456");
    }
}
