//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`products`] - 条码查询接口（草稿聚合的商品查询协作方）
//! - [`bills`] - 账单定稿与查询接口
//! - [`payments`] - 支付回调验证接口
//! - `/ws` - 扫码/收银会话的 WebSocket 升级入口

pub mod bills;
pub mod health;
pub mod payments;
pub mod products;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use shared::error::{ApiResponse, AppResult};

/// 组装全部路由
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ws", get(crate::relay::ws::handle_relay_ws))
        .merge(health::router())
        .merge(products::router())
        .merge(bills::router())
        .merge(payments::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Till Backend Ready"
}
