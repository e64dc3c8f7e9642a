//! Bill Repository
//!
//! 账单落库后不可变；在线支付路径先以 pending 状态写入，对账成功后
//! 一次性翻到 completed。`mark_completed` 带状态守卫，保证已定稿的
//! 账单不会被二次定稿。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::draft::TxMode;
use shared::models::{Bill, BillItem, BillStatus, Customer, PaymentMode};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};

/// SurrealDB bill 记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRow {
    pub bill_id: String,
    pub date: DateTime<Utc>,
    pub staff: String,
    pub customer: Customer,
    pub mode: TxMode,
    pub payment_mode: PaymentMode,
    pub status: BillStatus,
    pub total: Decimal,
    pub items: Vec<BillItem>,
    pub created_at: i64,
}

impl From<BillRow> for Bill {
    fn from(row: BillRow) -> Self {
        Bill {
            id: Some(row.bill_id),
            date: row.date,
            staff: row.staff,
            customer: row.customer,
            mode: row.mode,
            payment_mode: row.payment_mode,
            status: row.status,
            total: row.total,
            items: row.items,
        }
    }
}

#[derive(Clone)]
pub struct BillRepository {
    base: BaseRepository,
}

impl BillRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// 写入一张新账单，返回带生成 ID 的账单
    pub async fn create(&self, bill: &Bill) -> RepoResult<Bill> {
        let bill_id = shared::util::snowflake_id().to_string();
        let rows: Vec<BillRow> = self
            .base
            .db()
            .query(
                r#"
                CREATE bill SET
                    bill_id      = $bill_id,
                    date         = $date,
                    staff        = $staff,
                    customer     = $customer,
                    mode         = $mode,
                    payment_mode = $payment_mode,
                    status       = $status,
                    total        = $total,
                    items        = $items,
                    created_at   = $created_at
                "#,
            )
            .bind(("bill_id", bill_id))
            .bind(("date", bill.date))
            .bind(("staff", bill.staff.clone()))
            .bind(("customer", bill.customer.clone()))
            .bind(("mode", bill.mode))
            .bind(("payment_mode", bill.payment_mode))
            .bind(("status", bill.status))
            .bind(("total", bill.total))
            .bind(("items", bill.items.clone()))
            .bind(("created_at", shared::util::now_millis()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;

        rows.into_iter()
            .next()
            .map(Bill::from)
            .ok_or_else(|| RepoError::Database("CREATE bill returned no row".into()))
    }

    /// 按 ID 查账单
    pub async fn find_by_id(&self, bill_id: &str) -> RepoResult<Option<Bill>> {
        let rows: Vec<BillRow> = self
            .base
            .db()
            .query("SELECT * FROM bill WHERE bill_id = $bill_id")
            .bind(("bill_id", bill_id.to_string()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(rows.into_iter().next().map(Bill::from))
    }

    /// 账单列表，新的在前
    pub async fn list(&self) -> RepoResult<Vec<Bill>> {
        let rows: Vec<BillRow> = self
            .base
            .db()
            .query("SELECT * FROM bill ORDER BY created_at DESC")
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(rows.into_iter().map(Bill::from).collect())
    }

    /// pending → completed，带状态守卫
    ///
    /// 只在账单仍处于 pending 时翻转，返回是否翻转成功。已 completed
    /// 或已 void 的账单不受影响。
    pub async fn mark_completed(&self, bill_id: &str) -> RepoResult<bool> {
        let rows: Vec<BillRow> = self
            .base
            .db()
            .query(
                "UPDATE bill SET status = 'completed' WHERE bill_id = $bill_id AND status = 'pending'",
            )
            .bind(("bill_id", bill_id.to_string()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(!rows.is_empty())
    }

    /// pending → void（过期清理用），带同样的状态守卫
    pub async fn mark_void(&self, bill_id: &str) -> RepoResult<bool> {
        let rows: Vec<BillRow> = self
            .base
            .db()
            .query(
                "UPDATE bill SET status = 'void' WHERE bill_id = $bill_id AND status = 'pending'",
            )
            .bind(("bill_id", bill_id.to_string()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(!rows.is_empty())
    }
}
