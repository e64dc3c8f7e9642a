//! Till Server - 扫码开单系统的单进程服务端
//!
//! # 架构概述
//!
//! 本模块是 Till Server 的主入口，提供以下核心功能：
//!
//! - **中继** (`relay`): 员工维度的扫码/收银会话注册与事件转发
//! - **开单** (`billing`): 草稿会话、定稿编排、库存更新、发票渲染
//! - **支付** (`payment`): 网关下单与异步回调的幂等对账
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **HTTP API** (`api`): RESTful API 与 WebSocket 升级入口
//!
//! # 模块结构
//!
//! ```text
//! till-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── relay/         # 会话注册表、事件路由、WebSocket 连接
//! ├── billing/       # 草稿会话、定稿状态机、库存、发票
//! ├── payment/       # 网关客户端、签名校验、对账
//! ├── db/            # 数据库层
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod billing;
pub mod core;
pub mod db;
pub mod payment;
pub mod relay;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use relay::{ClientHandle, SessionRegistry};

// Re-export unified error types from shared
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

pub fn print_banner() {
    println!(
        r#"
  ______  _  __ __
 /_  __/ (_)/ // /
  / /   / // // /
 / /   / // // /
/_/   /_//_//_/
    "#
    );
}
