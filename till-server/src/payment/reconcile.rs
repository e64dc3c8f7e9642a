//! 支付对账
//!
//! 网关回调可能至少一次地重复投递。幂等的关键顺序：**先消费**
//! 订单映射（删除并返回），**再施加**库存与发票效果 —— 重复回调
//! 拿不到映射，成为安全的 no-op，绝不双重扣减库存。
//!
//! 验签失败是硬失败：不消费映射、不改任何状态。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use shared::error::{AppError, AppResult};
use shared::models::{Invoice, VerifyRequest};

use crate::billing::{inventory, invoice};
use crate::db::repository::{BillRepository, PendingOrderRepository, ProductRepository};
use crate::payment::gateway;

/// 对账服务
#[derive(Clone)]
pub struct ReconcileService {
    pending: PendingOrderRepository,
    bills: BillRepository,
    products: ProductRepository,
    secret: String,
}

impl ReconcileService {
    pub fn new(
        pending: PendingOrderRepository,
        bills: BillRepository,
        products: ProductRepository,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            pending,
            bills,
            products,
            secret: secret.into(),
        }
    }

    /// 验证网关回调并完成延迟的定稿
    ///
    /// 成功路径：验签 → 消费映射 → 账单翻 completed → 逐件库存 →
    /// 渲染发票。对已处理过的订单重复调用返回 AlreadyReconciled，
    /// 不施加任何效果。
    pub async fn verify(&self, req: &VerifyRequest) -> AppResult<Invoice> {
        if !gateway::verify_signature(&self.secret, &req.order_id, &req.payment_id, &req.signature)
        {
            tracing::warn!(
                order_id = %req.order_id,
                payment_id = %req.payment_id,
                "Payment signature mismatch"
            );
            return Err(AppError::payment_auth("Payment signature verification failed"));
        }

        // Consume the mapping BEFORE applying any effect. A redelivered
        // callback finds nothing to consume and stops here.
        let Some(mapping) = self
            .pending
            .take(&req.order_id)
            .await
            .map_err(AppError::from)?
        else {
            tracing::info!(order_id = %req.order_id, "Duplicate or unknown payment callback");
            return Err(AppError::already_reconciled(req.order_id.clone()));
        };

        let completed = self
            .bills
            .mark_completed(&mapping.bill_id)
            .await
            .map_err(AppError::from)?;
        if !completed {
            // Mapping existed but the bill already left pending; the
            // expiry sweeper and a late callback can race this way.
            tracing::warn!(
                order_id = %req.order_id,
                bill_id = %mapping.bill_id,
                "Pending mapping consumed but bill was not pending"
            );
            return Err(AppError::already_reconciled(req.order_id.clone()));
        }

        let bill = self
            .bills
            .find_by_id(&mapping.bill_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                tracing::error!(
                    order_id = %req.order_id,
                    bill_id = %mapping.bill_id,
                    "Pending mapping references missing bill"
                );
                AppError::internal("Reconciled order references a missing bill")
            })?;

        inventory::apply(&self.products, &bill).await;

        tracing::info!(
            order_id = %req.order_id,
            payment_id = %req.payment_id,
            bill_id = %mapping.bill_id,
            total = %bill.total,
            "Payment reconciled"
        );
        Ok(invoice::render(&bill))
    }

    /// 清理一轮过期的待支付订单
    ///
    /// 删除早于 TTL 的映射并把对应账单置 void，返回清理条数。
    pub async fn expire_stale(&self, ttl: Duration) -> AppResult<usize> {
        let cutoff = shared::util::now_millis() - ttl.as_millis() as i64;
        let expired = self
            .pending
            .expire_before(cutoff)
            .await
            .map_err(AppError::from)?;

        for row in &expired {
            match self.bills.mark_void(&row.bill_id).await {
                Ok(true) => {
                    tracing::info!(
                        order_id = %row.order_id,
                        bill_id = %row.bill_id,
                        "Voided abandoned pending bill"
                    );
                }
                Ok(false) => {
                    tracing::warn!(
                        order_id = %row.order_id,
                        bill_id = %row.bill_id,
                        "Expired mapping but bill was not pending"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %row.order_id,
                        bill_id = %row.bill_id,
                        error = %e,
                        "Failed to void expired pending bill"
                    );
                }
            }
        }

        Ok(expired.len())
    }

    /// 周期清理循环（后台任务入口）
    pub async fn run_expiry_loop(self, ttl: Duration, interval: Duration, token: CancellationToken) {
        tracing::info!(
            ttl_min = ttl.as_secs() / 60,
            interval_s = interval.as_secs(),
            "Pending order expiry task started"
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Pending order expiry task stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.expire_stale(ttl).await {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(expired = n, "Expired stale pending orders"),
                        Err(e) => tracing::error!(error = %e, "Pending order expiry sweep failed"),
                    }
                }
            }
        }
    }
}
