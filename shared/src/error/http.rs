//! HTTP status code mapping and axum integration for error codes

use super::codes::ErrorCode;
use super::types::{ApiResponse, AppError};
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::BillNotFound
            | Self::ProductNotFound
            | Self::PaymentOrderNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::BillNotDraft
            | Self::ModeConflict
            | Self::AlreadyReconciled
            | Self::UnitAlreadySold
            | Self::UnitNotSold => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::PaymentAuthFailed => StatusCode::UNAUTHORIZED,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::EmptyBill
            | Self::CustomerMissing => StatusCode::BAD_REQUEST,

            // 502 / 504 upstream gateway
            Self::GatewayError => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::PartialInventoryUpdate => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                details = ?self.details,
                "Request failed"
            );
        }
        (status, Json(ApiResponse::<()>::error(&self))).into_response()
    }
}
