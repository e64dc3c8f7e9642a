//! Product Model
//!
//! 商品分两层：`ProductType` 是主数据（名称、价格、折扣），
//! `ProductUnit` 是一件带唯一条码的实物，`sold` 标记其库存状态。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product master data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub id: Option<String>,
    pub name: String,
    pub brand: String,
    pub category: String,
    /// Sales unit label, e.g. "pcs", "kg"
    pub unit: String,
    pub image_url: String,
    pub price: Decimal,
    /// Discount specification, e.g. `"5%"`; empty = no discount
    pub discount: String,
}

/// One physical, uniquely barcoded unit
///
/// Lifecycle: available (`sold = false`) → sold (`sold = true`) on a sell
/// finalize, and back on a return finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUnit {
    pub barcode: String,
    /// Reference to the owning [`ProductType`]
    pub type_id: String,
    pub sold: bool,
}

/// Denormalized lookup result for a scanned barcode
///
/// This is the product-lookup collaborator's response shape: master data
/// joined with the unit's current inventory state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub unit: String,
    pub image_url: String,
    pub price: Decimal,
    pub discount: String,
    pub sold: bool,
}
