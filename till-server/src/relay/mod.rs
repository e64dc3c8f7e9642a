//! 中继模块 - 扫码会话与收银会话的配对与事件转发
//!
//! # 架构
//!
//! ```text
//! Scan WS ──▶ RelayMessage::BarcodeScanned ──▶ EventRouter
//!                                                  │ lookup_bill(staff_id)
//!                                                  ▼
//! Bill WS ◀── BillingPush::BarcodeBroadcast ◀── SessionRegistry
//! ```
//!
//! 同一员工最多各持有一个扫码连接和一个收银连接；重复注册会替换旧
//! 连接（旧连接成为孤儿，其关闭事件不再影响注册表）。转发是尽力而
//! 为、至多一次：收银连接不在线时事件被丢弃并记录，不做排队。

pub mod registry;
pub mod router;
pub mod ws;

pub use registry::{ClientHandle, SessionRegistry, StaffSession};
pub use router::forward_scan;
