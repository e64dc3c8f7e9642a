//! Bill Model
//!
//! 账单一旦落库即不可变；商品行嵌入主数据的非规范化快照，保证历史
//! 价格不随商品改价而变。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::draft::TxMode;

/// Customer captured on a bill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Settled at the counter; finalization completes synchronously
    Cash,
    /// Settled through the payment gateway; finalization completes on
    /// the gateway's confirmation callback
    Online,
}

/// Bill lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Persisted, awaiting online payment confirmation
    Pending,
    /// Fully settled; inventory effects applied
    Completed,
    /// Abandoned pending bill, expired by the cleanup task
    Void,
}

/// One denormalized line on a persisted bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub unit: String,
    pub image_url: String,
    pub original_price: Decimal,
    pub discount: String,
    pub final_price: Decimal,
    pub qty: u32,
    /// Per-item inventory effect tag (sell or return)
    pub action: TxMode,
}

/// A persisted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: Option<String>,
    pub date: DateTime<Utc>,
    /// Staff reference (identifier, not a live session)
    pub staff: String,
    pub customer: Customer,
    pub mode: TxMode,
    pub payment_mode: PaymentMode,
    pub status: BillStatus,
    pub total: Decimal,
    pub items: Vec<BillItem>,
}
