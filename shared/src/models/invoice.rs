//! Invoice document model
//!
//! 发票是已落库账单的纯函数渲染结果；这里只承载结构化内容，渲染
//! 逻辑在服务器端。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Customer;

/// One printable line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub name: String,
    pub qty: u32,
    pub discount: String,
    /// `final_price × qty`
    pub line_total: Decimal,
}

/// Rendered invoice document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub bill_id: String,
    /// "Bill" for sell transactions, "Return" for returns
    pub title: String,
    pub date: DateTime<Utc>,
    pub customer: Customer,
    pub lines: Vec<InvoiceLine>,
    pub total: Decimal,
    /// Printable HTML rendering of the document
    pub html: String,
}
