//! Unified error codes for the Tribi backend
//!
//! Error codes are shared between the API server and its clients and are
//! organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: eSIM / provisioning errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1002,
    /// Token is invalid
    TokenInvalid = 1003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Plan not found
    PlanNotFound = 4002,
    /// Order has not been paid yet
    OrderNotPaid = 4003,
    /// Order has already been refunded
    OrderRefunded = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Unsupported payment provider
    PaymentProviderUnsupported = 5002,
    /// Payment provider call failed
    PaymentProviderError = 5003,
    /// Webhook signature missing or invalid
    WebhookSignatureInvalid = 5004,
    /// Webhook payload malformed
    WebhookPayloadInvalid = 5005,
    /// Payment intent ID already recorded
    DuplicateIntent = 5006,

    // ==================== 6xxx: eSIM ====================
    /// eSIM profile not found
    EsimNotFound = 6001,
    /// eSIM already activated or not ready for activation
    EsimNotReady = 6002,
    /// Provisioning backend unreachable or rejected the request
    ProvisioningFailed = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::PlanNotFound => "Plan not found",
            ErrorCode::OrderNotPaid => "Order must be paid before activating eSIM",
            ErrorCode::OrderRefunded => "Order has already been refunded",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentProviderUnsupported => "Unsupported payment provider",
            ErrorCode::PaymentProviderError => "Payment provider call failed",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature missing or invalid",
            ErrorCode::WebhookPayloadInvalid => "Webhook payload malformed",
            ErrorCode::DuplicateIntent => "Payment intent already recorded",

            // eSIM
            ErrorCode::EsimNotFound => "eSIM profile not found",
            ErrorCode::EsimNotReady => "eSIM already activated or not ready for activation",
            ErrorCode::ProvisioningFailed => "Unable to provision eSIM",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::TokenExpired),
            1003 => Ok(ErrorCode::TokenInvalid),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::PlanNotFound),
            4003 => Ok(ErrorCode::OrderNotPaid),
            4004 => Ok(ErrorCode::OrderRefunded),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentProviderUnsupported),
            5003 => Ok(ErrorCode::PaymentProviderError),
            5004 => Ok(ErrorCode::WebhookSignatureInvalid),
            5005 => Ok(ErrorCode::WebhookPayloadInvalid),
            5006 => Ok(ErrorCode::DuplicateIntent),

            // eSIM
            6001 => Ok(ErrorCode::EsimNotFound),
            6002 => Ok(ErrorCode::EsimNotReady),
            6003 => Ok(ErrorCode::ProvisioningFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
