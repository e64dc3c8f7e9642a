//! Unified error handling shared by the server and its clients.
//!
//! - [`ErrorCode`] - stable u16 codes, banded by domain
//! - [`AppError`] - structured error with code, message and details
//! - [`ApiResponse`] - uniform HTTP response envelope

pub mod codes;
pub mod http;
pub mod types;

pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResult};
