//! Business logic
//!
//! The only code allowed to mutate status columns. API handlers stay thin
//! and delegate here; everything returns `ServiceResult` so `?` propagation
//! flows straight into the error envelope.

pub mod activation;
pub mod analytics;
pub mod billing;
pub mod orders;
pub mod payments;
pub mod pricing;
