//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type across the Till stack, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging (staff_id, barcode, bill_id …)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, replay context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

/// Result alias for fallible operations surfaced to API callers
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create an invalid request error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create a sell/return mode conflict error
    pub fn mode_conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ModeConflict, msg)
    }

    /// Create a payment authentication failure (signature mismatch)
    pub fn payment_auth(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PaymentAuthFailed, msg)
    }

    /// Create an already-reconciled error (idempotent retry of verify)
    pub fn already_reconciled(order_id: impl Into<String>) -> Self {
        let id = order_id.into();
        Self::with_message(
            ErrorCode::AlreadyReconciled,
            format!("Payment order {} already reconciled", id),
        )
        .with_detail("order_id", id)
    }

    /// Create a gateway error
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::GatewayError, msg)
    }

    /// Create a gateway timeout error
    pub fn gateway_timeout(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::GatewayTimeout, msg)
    }

    /// Create a product-not-found error, phrased for the requested action
    pub fn product_not_found(barcode: impl Into<String>, wants_sold: bool) -> Self {
        let b = barcode.into();
        let msg = if wants_sold {
            format!("No previously sold unit with barcode {}", b)
        } else {
            format!("No available unit with barcode {}", b)
        };
        Self::with_message(ErrorCode::ProductNotFound, msg).with_detail("barcode", b)
    }
}

/// Unified API response envelope
///
/// ```json
/// { "code": 0, "message": "Success", "data": { … } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (0 = success)
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Response payload, absent on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response with payload
    pub fn success(data: T) -> Self {
        Self {
            code: ErrorCode::Success,
            message: ErrorCode::Success.message().to_string(),
            data: Some(data),
        }
    }

    /// Successful response with payload and custom message
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: ErrorCode::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Error response mirroring an [`AppError`]
    pub fn error(err: &AppError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Successful response without payload
    pub fn ok() -> Self {
        Self::success(())
    }
}
