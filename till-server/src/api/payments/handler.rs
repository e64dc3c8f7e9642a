//! Payment API Handlers

use axum::{Json, extract::State};

use shared::error::{ApiResponse, AppResult};
use shared::models::{Invoice, VerifyRequest};

use crate::core::ServerState;

/// Verify a gateway payment confirmation and complete the deferred
/// finalization
///
/// 幂等：同一订单的重复验证返回 409 AlreadyReconciled，不重复施加
/// 库存效果。验签失败返回 401，不消费映射。
pub async fn verify(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let invoice = state.reconcile_service().verify(&payload).await?;
    Ok(Json(ApiResponse::success(invoice)))
}
