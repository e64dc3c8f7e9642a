//! Unified error codes for the Till stack
//!
//! Error codes are shared across till-server and its billing/scan clients,
//! organized by category:
//! - 0xxx: General errors
//! - 4xxx: Bill errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / inventory errors
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

    // ==================== 4xxx: Bill ====================
    /// Bill not found
    BillNotFound = 4001,
    /// Bill has already left the draft state
    BillNotDraft = 4002,
    /// Scan conflicts with the locked sell/return mode of the draft
    ModeConflict = 4003,
    /// Bill has no items
    EmptyBill = 4004,
    /// Customer information missing
    CustomerMissing = 4005,

    // ==================== 5xxx: Payment ====================
    /// Payment signature verification failed
    PaymentAuthFailed = 5001,
    /// No pending payment order for the given handle
    PaymentOrderNotFound = 5002,
    /// Payment order was already reconciled
    AlreadyReconciled = 5003,
    /// Payment gateway rejected the request
    GatewayError = 5004,
    /// Payment gateway did not answer within the deadline
    GatewayTimeout = 5005,

    // ==================== 6xxx: Product ====================
    /// No unit with that barcode in the state the action requires
    ProductNotFound = 6001,
    /// Unit is already marked sold
    UnitAlreadySold = 6002,
    /// Unit was never sold, cannot be returned
    UnitNotSold = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Bill persisted but one or more inventory updates failed
    PartialInventoryUpdate = 9003,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::BillNotFound => "Bill not found",
            Self::BillNotDraft => "Bill has already been finalized",
            Self::ModeConflict => "Scan conflicts with the bill mode",
            Self::EmptyBill => "Bill has no items",
            Self::CustomerMissing => "Customer information missing",

            Self::PaymentAuthFailed => "Payment signature verification failed",
            Self::PaymentOrderNotFound => "Payment order not found",
            Self::AlreadyReconciled => "Payment order already reconciled",
            Self::GatewayError => "Payment gateway error",
            Self::GatewayTimeout => "Payment gateway timed out",

            Self::ProductNotFound => "Product not found",
            Self::UnitAlreadySold => "Unit already sold",
            Self::UnitNotSold => "Unit has not been sold",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::PartialInventoryUpdate => "Partial inventory update",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),

            4001 => Ok(Self::BillNotFound),
            4002 => Ok(Self::BillNotDraft),
            4003 => Ok(Self::ModeConflict),
            4004 => Ok(Self::EmptyBill),
            4005 => Ok(Self::CustomerMissing),

            5001 => Ok(Self::PaymentAuthFailed),
            5002 => Ok(Self::PaymentOrderNotFound),
            5003 => Ok(Self::AlreadyReconciled),
            5004 => Ok(Self::GatewayError),
            5005 => Ok(Self::GatewayTimeout),

            6001 => Ok(Self::ProductNotFound),
            6002 => Ok(Self::UnitAlreadySold),
            6003 => Ok(Self::UnitNotSold),

            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::PartialInventoryUpdate),

            other => Err(format!("unknown error code: {}", other)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_u16() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ModeConflict,
            ErrorCode::PaymentAuthFailed,
            ErrorCode::AlreadyReconciled,
            ErrorCode::PartialInventoryUpdate,
        ];
        for code in codes {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(ErrorCode::try_from(12345).is_err());
    }
}
