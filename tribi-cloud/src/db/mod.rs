//! Database access layer
//!
//! Thin query modules over sqlx. Row structs mirror the table layout;
//! status columns stay as TEXT and are parsed by the service layer through
//! the `shared::status` enums.

pub mod analytics;
pub mod esims;
pub mod inventory;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod plans;
