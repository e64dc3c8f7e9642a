//! Bill API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::error::{ApiResponse, AppError, AppResult};
use shared::models::Bill;

use crate::billing::{FinalizeOutcome, FinalizeRequest};
use crate::core::ServerState;

/// Finalize a draft bill
///
/// 现金路径同步返回渲染好的发票；在线路径返回网关订单句柄，发票
/// 延迟到支付验证接口。
pub async fn finalize(
    State(state): State<ServerState>,
    Json(payload): Json<FinalizeRequest>,
) -> AppResult<Json<ApiResponse<FinalizeOutcome>>> {
    let outcome = state.finalize_service().finalize(payload).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// List all bills, newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Bill>>>> {
    let bills = state.bill_repo().list().await.map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(bills)))
}

/// Get bill by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Bill>>> {
    let bill = state
        .bill_repo()
        .find_by_id(&id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found(format!("Bill {}", id)))?;
    Ok(Json(ApiResponse::success(bill)))
}
