//! 开单模块 - 草稿会话、定稿编排、库存更新、发票渲染
//!
//! # 数据流
//!
//! ```text
//! BarcodeBroadcast ─▶ BillingSession ─▶ DraftTransaction (+ pricing)
//!                          │ 确认
//!                          ▼
//!                   FinalizeService ──┬─ cash ──▶ 落库 ─▶ 库存 ─▶ 发票
//!                                     └─ online ─▶ 落库(pending) ─▶ 网关下单
//! ```
//!
//! 在线路径的库存与发票延迟到支付对账（见 [`crate::payment`]）。

pub mod finalize;
pub mod inventory;
pub mod invoice;
pub mod session;

pub use finalize::{FinalizeOutcome, FinalizeRequest, FinalizeService};
pub use session::{BillingSession, DbProductLookup, ProductLookup, ScanOutcome};
