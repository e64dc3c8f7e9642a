//! Payment DTOs
//!
//! 在线支付路径：账单先以 pending 状态落库，再向网关创建支付订单，
//! 网关回调经 `VerifyRequest` 验签后完成对账。

use serde::{Deserialize, Serialize};

/// Gateway confirmation callback payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
    /// Hex-encoded HMAC-SHA256 of `"{order_id}|{payment_id}"`
    pub signature: String,
}

/// Handle returned to the billing client for an online payment
///
/// The client hands `order_id` to the gateway's checkout widget; the
/// amount is in minor currency units as gateways expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheckout {
    pub order_id: String,
    pub bill_id: String,
    pub amount_minor: i64,
    pub currency: String,
}
