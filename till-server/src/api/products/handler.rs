//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::draft::TxMode;
use shared::error::{ApiResponse, AppResult};
use shared::models::ProductInfo;

use crate::billing::ProductLookup;
use crate::core::ServerState;

/// Query params for barcode lookup
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// 省略时默认 sell（查未售出的件）
    #[serde(default)]
    pub action: Option<TxMode>,
}

/// Look up the product behind a scanned barcode
///
/// sell 要求未售出的件，return 要求已售出的件；状态不符返回 404，
/// 消息区分两种情况。
pub async fn get_by_barcode(
    State(state): State<ServerState>,
    Path(barcode): Path<String>,
    Query(query): Query<LookupQuery>,
) -> AppResult<Json<ApiResponse<ProductInfo>>> {
    let action = query.action.unwrap_or(TxMode::Sell);
    let info = state.product_lookup().lookup(&barcode, action).await?;
    Ok(Json(ApiResponse::success(info)))
}
