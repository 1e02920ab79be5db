//! Shared types for the Tribi backend
//!
//! - [`error`]: unified error codes, `AppError`, and the `ApiResponse` envelope
//! - [`status`]: closed status enums for orders, payments, eSIM profiles and inventory
//! - [`util`]: timestamps and ID generation

pub mod error;
pub mod status;
pub mod util;
