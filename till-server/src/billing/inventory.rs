//! 库存更新
//!
//! 按账单逐件翻转 sold 标记：sell ⇒ true，return ⇒ false。每件是
//! 独立、幂等的写入，并发执行、顺序无关；失败的件只记录上下文供
//! 人工重放，不回滚已完成的件。

use futures::future::join_all;

use shared::models::Bill;

use crate::db::repository::ProductRepository;

/// 一轮库存更新的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryOutcome {
    /// 成功翻转的条码数
    pub updated: usize,
    /// 更新失败的条码（含不存在的条码）
    pub failed: Vec<String>,
}

impl InventoryOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 应用一张账单的全部库存效果
///
/// 一旦开始不可取消；部分完成按 PartialInventoryFailure 记录，对用户
/// 不致命（账单已落库），留待外部对账。
pub async fn apply(products: &ProductRepository, bill: &Bill) -> InventoryOutcome {
    let bill_id = bill.id.clone().unwrap_or_default();

    let updates = bill.items.iter().map(|item| {
        let target = item.action.target_sold_flag();
        let barcode = item.barcode.clone();
        async move {
            match products.set_sold(&barcode, target).await {
                Ok(true) => Ok(barcode),
                Ok(false) => Err((barcode, "no unit with this barcode".to_string())),
                Err(e) => Err((barcode, e.to_string())),
            }
        }
    });

    let mut outcome = InventoryOutcome::default();
    for result in join_all(updates).await {
        match result {
            Ok(_) => outcome.updated += 1,
            Err((barcode, reason)) => {
                tracing::error!(
                    bill_id = %bill_id,
                    barcode = %barcode,
                    reason = %reason,
                    "Inventory update failed, needs external reconciliation"
                );
                outcome.failed.push(barcode);
            }
        }
    }

    if !outcome.is_complete() {
        tracing::error!(
            bill_id = %bill_id,
            updated = outcome.updated,
            failed = outcome.failed.len(),
            "Partial inventory update for persisted bill"
        );
    }

    outcome
}
