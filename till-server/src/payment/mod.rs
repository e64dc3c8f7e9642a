//! 支付模块 - 网关下单与异步回调的幂等对账
//!
//! 网关是外部协作方：定稿的在线路径向它创建支付订单，随后它以
//! 回调送达确认。回调可能至少一次地重复投递；对账通过「先消费
//! 映射、后施加效果」保持幂等（见 [`reconcile`]）。

pub mod gateway;
pub mod reconcile;

pub use gateway::{GatewayOrder, HttpPaymentGateway, PaymentGateway};
pub use reconcile::ReconcileService;
