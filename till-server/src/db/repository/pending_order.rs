//! Pending Payment Order Repository
//!
//! 网关订单号 → 账单的瞬态映射。`take` 以「删除并返回删除前的行」
//! 实现一次性消费：第二次对同一订单号调用拿不到行，对账因此天然
//! 幂等。order_id UNIQUE 索引防止重复建单。

use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};

/// SurrealDB pending_order 记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrderRow {
    pub order_id: String,
    pub bill_id: String,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct PendingOrderRepository {
    base: BaseRepository,
}

impl PendingOrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// 登记一条订单号 → 账单映射
    pub async fn create(&self, order_id: &str, bill_id: &str) -> RepoResult<PendingOrderRow> {
        let rows: Vec<PendingOrderRow> = self
            .base
            .db()
            .query(
                r#"
                CREATE pending_order SET
                    order_id   = $order_id,
                    bill_id    = $bill_id,
                    created_at = $created_at
                "#,
            )
            .bind(("order_id", order_id.to_string()))
            .bind(("bill_id", bill_id.to_string()))
            .bind(("created_at", shared::util::now_millis()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("CREATE pending_order returned no row".into()))
    }

    /// 消费一条映射：删除并返回删除前的行
    ///
    /// 映射不存在（未建过或已被消费）时返回 `None`。
    pub async fn take(&self, order_id: &str) -> RepoResult<Option<PendingOrderRow>> {
        let rows: Vec<PendingOrderRow> = self
            .base
            .db()
            .query("DELETE pending_order WHERE order_id = $order_id RETURN BEFORE")
            .bind(("order_id", order_id.to_string()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(rows.into_iter().next())
    }

    /// 删除并返回所有早于 `cutoff_ms` 创建的映射（过期清理用）
    pub async fn expire_before(&self, cutoff_ms: i64) -> RepoResult<Vec<PendingOrderRow>> {
        let rows: Vec<PendingOrderRow> = self
            .base
            .db()
            .query("DELETE pending_order WHERE created_at < $cutoff RETURN BEFORE")
            .bind(("cutoff", cutoff_ms))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(rows)
    }
}
