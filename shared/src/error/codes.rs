//! Unified error codes for the order pricing service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Pricing errors
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
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    OrderVersionNotFound = 4002,
    OrderStatusInvalid = 4003,
    OrderEmpty = 4004,
    ServiceNotSelected = 4005,

    // ==================== 6xxx: Pricing ====================
    PricingPolicyNotFound = 6801,
    PricingPolicyNameExists = 6802,
    PricingRatioInvalid = 6803,
    PricingTierInvalid = 6804,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    TimeoutError = 9004,
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    StorageFull = 9401,
    StorageCorrupted = 9403,
    SystemBusy = 9404,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderVersionNotFound => "Order version not found",
            ErrorCode::OrderStatusInvalid => "Invalid order status",
            ErrorCode::OrderEmpty => "Order has no priced items",
            ErrorCode::ServiceNotSelected => "No service selected",

            // Pricing
            ErrorCode::PricingPolicyNotFound => "Pricing policy not found",
            ErrorCode::PricingPolicyNameExists => "Pricing policy name already exists",
            ErrorCode::PricingRatioInvalid => "Discount ratio must be within (0, 100]",
            ErrorCode::PricingTierInvalid => "Invalid discount tier",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::SystemBusy => "System busy, please retry later",
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
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderVersionNotFound),
            4003 => Ok(ErrorCode::OrderStatusInvalid),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::ServiceNotSelected),

            // Pricing
            6801 => Ok(ErrorCode::PricingPolicyNotFound),
            6802 => Ok(ErrorCode::PricingPolicyNameExists),
            6803 => Ok(ErrorCode::PricingRatioInvalid),
            6804 => Ok(ErrorCode::PricingTierInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderVersionNotFound.code(), 4002);
        assert_eq!(ErrorCode::PricingPolicyNotFound.code(), 6801);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(4002), Ok(ErrorCode::OrderVersionNotFound));
        assert_eq!(ErrorCode::try_from(6803), Ok(ErrorCode::PricingRatioInvalid));
        assert_eq!(ErrorCode::try_from(9404), Ok(ErrorCode::SystemBusy));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
        assert_eq!(
            InvalidErrorCode(1234).to_string(),
            "invalid error code: 1234"
        );
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::OrderNotFound).unwrap();
        assert_eq!(json, "4001");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6801").unwrap();
        assert_eq!(code, ErrorCode::PricingPolicyNotFound);
        assert!(serde_json::from_str::<ErrorCode>("4999").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::Success.to_string(), "E0000");
        assert_eq!(ErrorCode::ValidationFailed.to_string(), "E0002");
        assert_eq!(ErrorCode::OrderNotFound.to_string(), "E4001");
    }

    #[test]
    fn test_roundtrip() {
        let codes = [
            ErrorCode::ValidationFailed,
            ErrorCode::OrderEmpty,
            ErrorCode::PricingTierInvalid,
            ErrorCode::StorageCorrupted,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(u16::from(code)), Ok(code));
        }
    }
}
