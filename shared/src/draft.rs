//! 草稿账单聚合 - 收银会话本地的草稿状态
//!
//! 草稿是尚未落库的账单，由扫码事件逐条累积而成。所有转移函数都是
//! 纯函数：输入当前快照，输出新的不可变快照，便于在无 UI 的环境下
//! 测试，也便于收银端做乐观更新。
//!
//! # 不变量
//!
//! - 条码在草稿内唯一；重复扫同一条码让数量 +1
//! - 第一件被接受的商品锁定整单的 sell/return 模式
//! - 与锁定模式冲突的扫码被拒绝且不改变任何状态
//! - 删除商品行后该条码可以重新扫入

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Customer;
use crate::pricing;

/// 整单交易模式：售出或退货
///
/// 模式由第一件商品的库存状态推导（见 [`TxMode::implied_by`]），
/// 在草稿生命周期内固定不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxMode {
    /// 商品离开库存（sold = true）
    Sell,
    /// 商品回到库存（sold = false）
    Return,
}

impl TxMode {
    /// The business rule deciding the mode a scanned unit implies:
    /// an available unit is being sold, a previously sold unit is
    /// being returned.
    ///
    /// This silently derives transaction mode from external inventory
    /// state, so it lives here as a named decision point rather than
    /// inline in the aggregator.
    pub fn implied_by(unit_sold: bool) -> Self {
        if unit_sold { TxMode::Return } else { TxMode::Sell }
    }

    /// The sold flag a unit ends up with after finalizing this mode
    pub fn target_sold_flag(&self) -> bool {
        matches!(self, TxMode::Sell)
    }
}

impl std::fmt::Display for TxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxMode::Sell => write!(f, "sell"),
            TxMode::Return => write!(f, "return"),
        }
    }
}

/// Draft aggregation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Cannot mix {attempted} items in a {locked} bill")]
    ModeConflict { locked: TxMode, attempted: TxMode },
}

/// 草稿账单中的一行商品
///
/// 字段是商品主数据的非规范化快照；最终落库时原样嵌入账单，保证
/// 历史价格不随商品改价而变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLineItem {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub unit: String,
    pub image_url: String,
    pub original_price: Decimal,
    /// 折扣说明，如 `"5%"`；空串表示无折扣
    pub discount: String,
    /// 折后单价，已按两位小数半进位舍入
    pub final_price: Decimal,
    pub qty: u32,
}

/// 草稿账单快照
///
/// 通过 [`DraftTransaction::add_or_increment`] / [`DraftTransaction::remove`] /
/// [`DraftTransaction::reset`] 演进；每个方法返回新快照，原快照不变。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftTransaction {
    pub customer: Customer,
    /// 锁定的交易模式；在第一件商品被接受前为 `None`
    pub mode: Option<TxMode>,
    /// 按扫入顺序排列，条码唯一
    pub items: Vec<DraftLineItem>,
}

impl DraftTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a scanned unit: lock the mode on first acceptance, then
    /// either increment the existing line for this barcode or append a
    /// new line with quantity 1.
    ///
    /// A scan whose implied mode conflicts with the locked mode returns
    /// [`DraftError::ModeConflict`] and leaves the snapshot untouched.
    pub fn add_or_increment(
        &self,
        implied: TxMode,
        item: DraftLineItem,
    ) -> Result<Self, DraftError> {
        if let Some(locked) = self.mode
            && locked != implied
        {
            return Err(DraftError::ModeConflict {
                locked,
                attempted: implied,
            });
        }

        let mut next = self.clone();
        next.mode = Some(self.mode.unwrap_or(implied));

        match next.items.iter_mut().find(|i| i.barcode == item.barcode) {
            Some(existing) => existing.qty += 1,
            None => next.items.push(DraftLineItem { qty: 1, ..item }),
        }
        Ok(next)
    }

    /// Remove the line for `barcode`; unknown barcodes are a no-op.
    ///
    /// The locked mode survives removal: it is fixed for the lifetime
    /// of the draft, even when the last line goes away.
    pub fn remove(&self, barcode: &str) -> Self {
        let mut next = self.clone();
        next.items.retain(|i| i.barcode != barcode);
        next
    }

    /// Discard everything and start a fresh draft
    pub fn reset(&self) -> Self {
        Self::new()
    }

    /// Replace the customer on the draft
    pub fn with_customer(&self, customer: Customer) -> Self {
        let mut next = self.clone();
        next.customer = customer;
        next
    }

    /// Bill total over the current lines
    pub fn total(&self) -> Decimal {
        pricing::total(self.items.iter().map(|i| (i.final_price, i.qty)))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(barcode: &str, price: &str) -> DraftLineItem {
        DraftLineItem {
            barcode: barcode.to_string(),
            name: "Milk 1L".to_string(),
            brand: "Amul".to_string(),
            category: "Dairy".to_string(),
            unit: "pcs".to_string(),
            image_url: String::new(),
            original_price: d(price),
            discount: String::new(),
            final_price: d(price),
            qty: 1,
        }
    }

    #[test]
    fn test_first_scan_locks_mode() {
        let draft = DraftTransaction::new();
        let draft = draft
            .add_or_increment(TxMode::implied_by(false), line("10001", "50"))
            .unwrap();
        assert_eq!(draft.mode, Some(TxMode::Sell));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].qty, 1);
    }

    #[test]
    fn test_rescan_increments_quantity() {
        let draft = DraftTransaction::new();
        let draft = draft
            .add_or_increment(TxMode::Sell, line("10001", "50"))
            .unwrap();
        let draft = draft
            .add_or_increment(TxMode::Sell, line("10001", "50"))
            .unwrap();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].qty, 2);
    }

    #[test]
    fn test_mode_conflict_rejected_without_mutation() {
        let draft = DraftTransaction::new();
        let draft = draft
            .add_or_increment(TxMode::Sell, line("10001", "50"))
            .unwrap();

        let err = draft
            .add_or_increment(TxMode::Return, line("10002", "30"))
            .unwrap_err();
        assert_eq!(
            err,
            DraftError::ModeConflict {
                locked: TxMode::Sell,
                attempted: TxMode::Return,
            }
        );
        // prior snapshot untouched
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.mode, Some(TxMode::Sell));
    }

    #[test]
    fn test_remove_allows_rescan() {
        let draft = DraftTransaction::new();
        let draft = draft
            .add_or_increment(TxMode::Sell, line("10001", "50"))
            .unwrap();
        let draft = draft.remove("10001");
        assert!(draft.is_empty());
        // mode stays locked for the lifetime of the draft
        assert_eq!(draft.mode, Some(TxMode::Sell));

        let draft = draft
            .add_or_increment(TxMode::Sell, line("10001", "50"))
            .unwrap();
        assert_eq!(draft.items[0].qty, 1);
    }

    #[test]
    fn test_reset_clears_mode_and_items() {
        let draft = DraftTransaction::new();
        let draft = draft
            .add_or_increment(TxMode::Return, line("10001", "50"))
            .unwrap();
        let draft = draft.reset();
        assert!(draft.is_empty());
        assert_eq!(draft.mode, None);
    }

    #[test]
    fn test_total_sums_rounded_lines() {
        let draft = DraftTransaction::new();
        let mut a = line("10001", "90.00");
        a.final_price = d("90.00");
        let b = line("10002", "50.00");

        let draft = draft.add_or_increment(TxMode::Sell, a.clone()).unwrap();
        let draft = draft.add_or_increment(TxMode::Sell, a).unwrap();
        let draft = draft.add_or_increment(TxMode::Sell, b).unwrap();
        assert_eq!(draft.total(), d("230.00"));
    }

    #[test]
    fn test_implied_mode_decision() {
        assert_eq!(TxMode::implied_by(false), TxMode::Sell);
        assert_eq!(TxMode::implied_by(true), TxMode::Return);
        assert!(TxMode::Sell.target_sold_flag());
        assert!(!TxMode::Return.target_sold_flag());
    }
}
